use super::{GeoError, GeoResult, Point};
use serde::{Deserialize, Serialize};

/// Polyline on the earth surface (a fault trace, a mesh edge).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Line {
    points: Vec<Point>,
}

impl Line {
    pub fn new(points: Vec<Point>) -> GeoResult<Self> {
        if points.len() < 2 {
            return Err(GeoError::InvalidLine(
                "a line needs at least two points".to_string(),
            ));
        }
        if points.windows(2).any(|pair| pair[0] == pair[1]) {
            return Err(GeoError::InvalidLine(
                "a line cannot contain repeated consecutive points".to_string(),
            ));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Point {
        self.points[0]
    }

    pub fn last(&self) -> Point {
        self.points[self.points.len() - 1]
    }

    /// Sum of the segment lengths, accounting for depth.
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|pair| pair[0].distance(&pair[1]))
            .sum()
    }

    /// Segment azimuths averaged as vectors weighted by segment length.
    pub fn average_azimuth(&self) -> f64 {
        if self.points.len() == 2 {
            return self.first().azimuth(&self.last());
        }
        let (mut sum_x, mut sum_y) = (0.0, 0.0);
        for pair in self.points.windows(2) {
            let length = pair[0].epicentral_distance(&pair[1]);
            let azimuth = pair[0].azimuth(&pair[1]).to_radians();
            sum_x += length * azimuth.sin();
            sum_y += length * azimuth.cos();
        }
        let azimuth = sum_x.atan2(sum_y).to_degrees();
        if azimuth < 0.0 { azimuth + 360.0 } else { azimuth }
    }

    /// Resamples the line at `spacing` km. Each vertex after the first is
    /// reached from the last resampled point, so spacing stays uniform
    /// across vertices and the final point may not coincide with the
    /// original end.
    pub fn resample(&self, spacing: f64) -> Line {
        let mut resampled = self.points[0].equally_spaced_points(&self.points[1], spacing);
        for vertex in &self.points[2..] {
            let Some(start) = resampled.last().copied() else {
                break;
            };
            let section = start.equally_spaced_points(vertex, spacing);
            resampled.extend(section.into_iter().skip(1));
        }
        Line { points: resampled }
    }

    /// Resamples into exactly `num_points` points, keeping both ends.
    pub fn resample_to_num_points(&self, num_points: usize) -> GeoResult<Line> {
        if num_points < 2 {
            return Err(GeoError::InvalidLine(
                "resampled line needs at least two points".to_string(),
            ));
        }
        let cumulative: Vec<f64> = std::iter::once(0.0)
            .chain(self.points.windows(2).scan(0.0, |total, pair| {
                *total += pair[0].distance(&pair[1]);
                Some(*total)
            }))
            .collect();
        let total = cumulative[cumulative.len() - 1];
        let step = total / (num_points - 1) as f64;

        let mut points = Vec::with_capacity(num_points);
        points.push(self.first());
        let mut segment = 0;
        for index in 1..num_points - 1 {
            let target = step * index as f64;
            while segment + 2 < cumulative.len() && cumulative[segment + 1] < target {
                segment += 1;
            }
            let start = self.points[segment];
            let end = self.points[segment + 1];
            let seg_length = cumulative[segment + 1] - cumulative[segment];
            let fraction = if seg_length > 0.0 {
                (target - cumulative[segment]) / seg_length
            } else {
                0.0
            };
            let hdist = start.epicentral_distance(&end) * fraction;
            let vdist = (end.depth - start.depth) * fraction;
            points.push(start.point_at(hdist, vdist, start.azimuth(&end)));
        }
        points.push(self.last());
        Ok(Line { points })
    }
}

#[cfg(test)]
mod tests {
    use super::Line;
    use crate::geo::Point;

    #[test]
    fn line_rejects_degenerate_input() {
        assert!(Line::new(vec![Point::surface(0.0, 0.0)]).is_err());
        assert!(Line::new(vec![Point::surface(0.0, 0.0), Point::surface(0.0, 0.0)]).is_err());
    }

    #[test]
    fn resample_keeps_uniform_spacing_across_vertices() {
        let line = Line::new(vec![
            Point::surface(0.0, 0.0),
            Point::surface(0.0, 0.1),
            Point::surface(0.1, 0.1),
        ])
        .expect("line");
        let resampled = line.resample(1.0);
        assert_eq!(resampled.first(), line.first());
        for pair in resampled.points().windows(2) {
            let spacing = pair[0].distance(&pair[1]);
            assert!(spacing > 0.9 && spacing < 1.1, "spacing {spacing}");
        }
        assert!((resampled.length() - line.length()).abs() < 1.0);
    }

    #[test]
    fn average_azimuth_weights_segments_by_length() {
        let line = Line::new(vec![
            Point::surface(0.0, 0.0),
            Point::surface(0.0, 0.1),
            Point::surface(0.1, 0.1),
        ])
        .expect("line");
        assert!((line.average_azimuth() - 45.0).abs() < 0.1);
        let straight = Line::new(vec![Point::surface(0.0, 0.0), Point::surface(0.1, 0.0)])
            .expect("line");
        assert!((straight.average_azimuth() - 90.0).abs() < 1.0e-6);
    }

    #[test]
    fn resample_to_num_points_keeps_ends() {
        let line = Line::new(vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(0.0, 0.2, 0.0),
            Point::new(0.0, 0.3, 0.0),
        ])
        .expect("line");
        let resampled = line.resample_to_num_points(4).expect("resampled");
        assert_eq!(resampled.len(), 4);
        assert_eq!(resampled.first(), line.first());
        assert_eq!(resampled.last(), line.last());
        assert!((resampled.points()[1].lat - 0.1).abs() < 1.0e-6);
    }
}
