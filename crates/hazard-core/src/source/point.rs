//! Point sources and area sources (a polygon discretized into points).

use super::{NodalPlane, Rupture, SourceError};
use crate::common::constants::{DISTANCE_TOLERANCE_KM, MAX_EARTH_ELEVATION_KM};
use crate::domain::HazardResult;
use crate::geo::{GeoResult, PlanarSurface, Point, Polygon};
use crate::mfd::Mfd;
use crate::pmf::Pmf;
use crate::scalerel::ScalingRelationship;
use crate::site::SiteCollection;
use crate::tom::{Occurrence, TemporalOccurrenceModel};
use serde::{Deserialize, Serialize};

/// Everything needed to turn a magnitude at a location into planar
/// ruptures: nodal planes, hypocentral depths and the seismogenic layer.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointRuptureParameters {
    pub magnitude_scaling_relationship: ScalingRelationship,
    pub rupture_aspect_ratio: f64,
    pub upper_seismogenic_depth: f64,
    pub lower_seismogenic_depth: f64,
    pub nodal_plane_distribution: Pmf<NodalPlane>,
    pub hypocenter_distribution: Pmf<f64>,
    pub rupture_mesh_spacing: f64,
}

impl PointRuptureParameters {
    pub fn validate(&self) -> Result<(), SourceError> {
        if !(self.rupture_mesh_spacing > 0.0) {
            return Err(SourceError::MeshSpacing(self.rupture_mesh_spacing));
        }
        if !(self.upper_seismogenic_depth >= MAX_EARTH_ELEVATION_KM) {
            return Err(SourceError::UpperSeismogenicDepth(
                self.upper_seismogenic_depth,
            ));
        }
        if !(self.lower_seismogenic_depth > self.upper_seismogenic_depth) {
            return Err(SourceError::SeismogenicLayer);
        }
        let layer = self.upper_seismogenic_depth..=self.lower_seismogenic_depth;
        if let Some((_, depth)) = self
            .hypocenter_distribution
            .iter()
            .find(|(_, depth)| !layer.contains(*depth))
        {
            return Err(SourceError::HypocenterDepth(*depth));
        }
        if !(self.rupture_aspect_ratio > 0.0) {
            return Err(SourceError::AspectRatio(self.rupture_aspect_ratio));
        }
        if let Some((_, plane)) = self
            .nodal_plane_distribution
            .iter()
            .find(|(_, plane)| !(plane.dip > 0.0 && plane.dip <= 90.0))
        {
            return Err(SourceError::Dip(plane.dip));
        }
        Ok(())
    }

    pub fn ruptures_per_magnitude(&self) -> usize {
        self.nodal_plane_distribution.len() * self.hypocenter_distribution.len()
    }

    /// Rupture length and width: the area from the scaling relationship
    /// split by the aspect ratio, with the width capped to what fits in
    /// the seismogenic layer at this dip.
    pub fn dimensions(&self, mag: f64, plane: &NodalPlane) -> (f64, f64) {
        let area = self
            .magnitude_scaling_relationship
            .median_area(mag, Some(plane.rake));
        let length = (area * self.rupture_aspect_ratio).sqrt();
        let width = area / length;
        let max_width = (self.lower_seismogenic_depth - self.upper_seismogenic_depth)
            / plane.dip.to_radians().sin();
        if width > max_width {
            (area / max_width, max_width)
        } else {
            (length, width)
        }
    }

    /// Vertical shift from the hypocenter to the rupture centre keeping the
    /// rupture inside the seismogenic layer.
    fn vertical_shift(&self, hypo_depth: f64, projected_height: f64) -> f64 {
        let shift = self.upper_seismogenic_depth - hypo_depth + projected_height / 2.0;
        if shift < 0.0 {
            (self.lower_seismogenic_depth - hypo_depth - projected_height / 2.0).min(0.0)
        } else {
            shift
        }
    }

    pub fn surface(
        &self,
        location: Point,
        hypo_depth: f64,
        mag: f64,
        plane: &NodalPlane,
    ) -> GeoResult<PlanarSurface> {
        let (length, width) = self.dimensions(mag, plane);
        let dip = plane.dip.to_radians();
        let projected_height = width * dip.sin();
        let projected_width = width * dip.cos();
        let hypocenter = Point::new(location.lon, location.lat, hypo_depth);

        let vshift = self.vertical_shift(hypo_depth, projected_height);
        let center = if vshift != 0.0 {
            let azimuth = if vshift < 0.0 {
                plane.strike + 270.0
            } else {
                plane.strike + 90.0
            };
            hypocenter.point_at((vshift / dip.tan()).abs(), vshift, azimuth.rem_euclid(360.0))
        } else {
            hypocenter
        };

        let theta = ((projected_width / 2.0) / (length / 2.0)).atan().to_degrees();
        let horizontal = ((length / 2.0).powi(2) + (projected_width / 2.0).powi(2)).sqrt();
        let half_height = projected_height / 2.0;
        let corner = |azimuth: f64, vertical: f64| {
            center.point_at(horizontal, vertical, azimuth.rem_euclid(360.0))
        };
        PlanarSurface::from_corners(
            plane.strike,
            plane.dip,
            corner(plane.strike + 180.0 + theta, -half_height),
            corner(plane.strike - theta, -half_height),
            corner(plane.strike + 180.0 - theta, half_height),
            corner(plane.strike + theta, half_height),
        )
    }

    /// Largest horizontal distance from the epicenter to any corner of any
    /// rupture with one of `mags`.
    pub fn max_radius(&self, mags: impl Iterator<Item = f64> + Clone) -> f64 {
        let mut radius: f64 = 0.0;
        for (_, plane) in self.nodal_plane_distribution.iter() {
            let dip = plane.dip.to_radians();
            for mag in mags.clone() {
                let (length, width) = self.dimensions(mag, plane);
                let corner = ((length / 2.0).powi(2) + (width * dip.cos() / 2.0).powi(2)).sqrt();
                for (_, depth) in self.hypocenter_distribution.iter() {
                    let vshift = self.vertical_shift(*depth, width * dip.sin());
                    radius = radius.max((vshift / dip.tan()).abs() + corner);
                }
            }
        }
        radius
    }

    /// Ruptures at one location, with every rate multiplied by `rate_factor`.
    pub(crate) fn ruptures_at<'a>(
        &'a self,
        location: Point,
        rates: Vec<(f64, f64)>,
        rate_factor: f64,
        tectonic_region_type: &'a str,
        tom: TemporalOccurrenceModel,
    ) -> impl Iterator<Item = HazardResult<Rupture>> + 'a {
        rates.into_iter().flat_map(move |(mag, mag_rate)| {
            self.nodal_plane_distribution
                .iter()
                .flat_map(move |(plane_probability, plane)| {
                    self.hypocenter_distribution
                        .iter()
                        .map(move |(depth_probability, depth)| -> HazardResult<Rupture> {
                            let surface = self.surface(location, *depth, mag, plane)?;
                            let rate =
                                mag_rate * plane_probability * depth_probability * rate_factor;
                            Ok(Rupture::new(
                                mag,
                                plane.rake,
                                tectonic_region_type,
                                Point::new(location.lon, location.lat, *depth),
                                surface.into(),
                                Occurrence::Parametric { rate, tom },
                            ))
                        })
                })
        })
    }
}

fn envelope_to_points(points: &[Point], radius: f64, sites: &SiteCollection) -> Vec<f64> {
    sites
        .locations()
        .map(|site| {
            let epicentral = points
                .iter()
                .map(|point| point.epicentral_distance(&site))
                .fold(f64::INFINITY, f64::min);
            (epicentral - radius - DISTANCE_TOLERANCE_KM).max(0.0)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointSource {
    pub location: Point,
    pub mfd: Mfd,
    #[serde(flatten)]
    pub rupture: PointRuptureParameters,
}

impl PointSource {
    pub fn validate(&self) -> Result<(), SourceError> {
        self.mfd.check_constraints()?;
        self.rupture.validate()
    }

    pub fn count_ruptures(&self) -> usize {
        self.mfd.annual_occurrence_rates().len() * self.rupture.ruptures_per_magnitude()
    }

    pub fn iter_ruptures<'a>(
        &'a self,
        tectonic_region_type: &'a str,
        tom: TemporalOccurrenceModel,
    ) -> impl Iterator<Item = HazardResult<Rupture>> + 'a {
        let location = Point::surface(self.location.lon, self.location.lat);
        let rates = self.mfd.annual_occurrence_rates();
        self.rupture
            .ruptures_at(location, rates, 1.0, tectonic_region_type, tom)
    }

    pub fn envelope_distance(&self, sites: &SiteCollection) -> Vec<f64> {
        let rates = self.mfd.annual_occurrence_rates();
        let radius = self.rupture.max_radius(rates.iter().map(|(mag, _)| *mag));
        envelope_to_points(&[self.location], radius, sites)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaSource {
    pub polygon: Polygon,
    pub area_discretization: f64,
    pub mfd: Mfd,
    #[serde(flatten)]
    pub rupture: PointRuptureParameters,
}

impl AreaSource {
    pub fn validate(&self) -> Result<(), SourceError> {
        self.mfd.check_constraints()?;
        self.rupture.validate()?;
        self.polygon.discretize(self.area_discretization)?;
        Ok(())
    }

    pub fn locations(&self) -> GeoResult<Vec<Point>> {
        self.polygon.discretize(self.area_discretization)
    }

    pub fn count_ruptures(&self) -> GeoResult<usize> {
        Ok(self.locations()?.len()
            * self.mfd.annual_occurrence_rates().len()
            * self.rupture.ruptures_per_magnitude())
    }

    /// Ruptures of every grid point, each point carrying an equal share
    /// of the source rates.
    pub fn iter_ruptures<'a>(
        &'a self,
        tectonic_region_type: &'a str,
        tom: TemporalOccurrenceModel,
    ) -> GeoResult<impl Iterator<Item = HazardResult<Rupture>> + 'a> {
        let locations = self.locations()?;
        let rates = self.mfd.annual_occurrence_rates();
        let rate_factor = 1.0 / locations.len() as f64;
        Ok(locations.into_iter().flat_map(move |location| {
            self.rupture.ruptures_at(
                location,
                rates.clone(),
                rate_factor,
                tectonic_region_type,
                tom,
            )
        }))
    }

    pub fn envelope_distance(&self, sites: &SiteCollection) -> GeoResult<Vec<f64>> {
        let rates = self.mfd.annual_occurrence_rates();
        let radius = self.rupture.max_radius(rates.iter().map(|(mag, _)| *mag));
        Ok(envelope_to_points(&self.locations()?, radius, sites))
    }
}

#[cfg(test)]
mod tests {
    use super::{AreaSource, PointRuptureParameters, PointSource};
    use crate::geo::{Point, Polygon};
    use crate::mfd::Mfd;
    use crate::pmf::Pmf;
    use crate::scalerel::ScalingRelationship;
    use crate::site::{ReferenceSiteParameters, SiteCollection};
    use crate::source::{NodalPlane, SourceError};
    use crate::tom::TemporalOccurrenceModel;

    fn parameters() -> PointRuptureParameters {
        PointRuptureParameters {
            magnitude_scaling_relationship: ScalingRelationship::PeerMsr,
            rupture_aspect_ratio: 1.0,
            upper_seismogenic_depth: 2.0,
            lower_seismogenic_depth: 16.0,
            nodal_plane_distribution: Pmf::new(vec![(1.0, NodalPlane::new(45.0, 30.0, 90.0))])
                .expect("nodal planes"),
            hypocenter_distribution: Pmf::new(vec![(1.0, 8.0)]).expect("hypocenters"),
            rupture_mesh_spacing: 1.0,
        }
    }

    fn point_source() -> PointSource {
        PointSource {
            location: Point::surface(0.0, 0.0),
            mfd: Mfd::TruncatedGr {
                a_val: 2.0,
                b_val: 1.0,
                min_mag: 5.0,
                max_mag: 6.0,
                bin_width: 1.0,
            },
            rupture: parameters(),
        }
    }

    fn tom() -> TemporalOccurrenceModel {
        TemporalOccurrenceModel::Poisson { time_span: 50.0 }
    }

    #[test]
    fn single_bin_point_source_yields_one_centred_rupture() {
        let source = point_source();
        let ruptures: Vec<_> = source
            .iter_ruptures("Active Shallow Crust", tom())
            .collect::<Result<_, _>>()
            .expect("ruptures");
        assert_eq!(ruptures.len(), 1);
        assert_eq!(source.count_ruptures(), 1);
        let rupture = &ruptures[0];
        assert!((rupture.mag() - 5.5).abs() < 1.0e-12);
        assert!((rupture.occurrence().rate().expect("rate") - 0.0009).abs() < 1.0e-12);

        let (length, width) = source.rupture.dimensions(5.5, &NodalPlane::new(45.0, 30.0, 90.0));
        assert!((length - 5.623413252).abs() < 1.0e-8);
        assert!((width - 5.623413252).abs() < 1.0e-8);

        let crate::geo::Surface::Planar(surface) = rupture.surface() else {
            panic!("point ruptures are planar");
        };
        let [top_left, _, _, bottom_right] = surface.corners();
        assert!((top_left.lon + 0.0333647435005).abs() < 1.0e-6);
        assert!((top_left.lat + 0.00239548066924).abs() < 1.0e-6);
        assert!((top_left.depth - 6.59414668702).abs() < 1.0e-6);
        assert!((bottom_right.lon - 0.0333647435005).abs() < 1.0e-6);
        assert!((bottom_right.lat - 0.00239548066924).abs() < 1.0e-6);
        assert!((bottom_right.depth - 9.40585331298).abs() < 1.0e-6);
    }

    #[test]
    fn width_is_capped_by_the_seismogenic_layer() {
        let mut parameters = parameters();
        parameters.lower_seismogenic_depth = 4.0;
        let plane = NodalPlane::new(0.0, 90.0, 0.0);
        let (length, width) = parameters.dimensions(6.0, &plane);
        assert!((width - 2.0).abs() < 1.0e-12);
        assert!((length * width - 100.0).abs() < 1.0e-9);
    }

    #[test]
    fn ruptures_stay_inside_the_seismogenic_layer() {
        let mut source = point_source();
        source.rupture.hypocenter_distribution =
            Pmf::new(vec![(0.5, 2.0), (0.5, 16.0)]).expect("hypocenters");
        for rupture in source.iter_ruptures("Active Shallow Crust", tom()) {
            let rupture = rupture.expect("rupture");
            let crate::geo::Surface::Planar(surface) = rupture.surface() else {
                panic!("point ruptures are planar");
            };
            let [top_left, _, bottom_left, _] = surface.corners();
            assert!(top_left.depth >= 2.0 - 1.0e-9);
            assert!(bottom_left.depth <= 16.0 + 1.0e-9);
        }
    }

    #[test]
    fn invalid_layers_are_rejected() {
        let mut source = point_source();
        source.rupture.lower_seismogenic_depth = 1.0;
        assert_eq!(source.validate(), Err(SourceError::SeismogenicLayer));

        let mut source = point_source();
        source.rupture.hypocenter_distribution = Pmf::new(vec![(1.0, 20.0)]).expect("pmf");
        assert_eq!(source.validate(), Err(SourceError::HypocenterDepth(20.0)));

        let mut source = point_source();
        source.rupture.rupture_mesh_spacing = 0.0;
        assert_eq!(source.validate(), Err(SourceError::MeshSpacing(0.0)));

        let mut source = point_source();
        source.rupture.upper_seismogenic_depth = -10.0;
        assert_eq!(source.validate(), Err(SourceError::UpperSeismogenicDepth(-10.0)));

        let mut source = point_source();
        source.rupture.rupture_aspect_ratio = 0.0;
        assert_eq!(source.validate(), Err(SourceError::AspectRatio(0.0)));
    }

    #[test]
    fn envelope_distance_is_conservative() {
        let source = point_source();
        let sites = SiteCollection::from_points(
            &[Point::surface(0.0, 0.0), Point::surface(1.0, 0.0)],
            ReferenceSiteParameters::default(),
        )
        .expect("sites");
        let envelope = source.envelope_distance(&sites);
        assert_eq!(envelope[0], 0.0);
        let rupture = source
            .iter_ruptures("Active Shallow Crust", tom())
            .next()
            .expect("one rupture")
            .expect("valid rupture");
        let rjb = rupture
            .surface()
            .joyner_boore_distance(1.0, 0.0)
            .expect("rjb");
        assert!(envelope[1] <= rjb);
        assert!(envelope[1] > rjb - 5.0);
    }

    #[test]
    fn area_source_splits_rates_over_grid_points() {
        let polygon = Polygon::new(vec![
            Point::surface(-0.1, -0.1),
            Point::surface(0.1, -0.1),
            Point::surface(0.1, 0.1),
            Point::surface(-0.1, 0.1),
        ])
        .expect("polygon");
        let source = AreaSource {
            polygon,
            area_discretization: 5.0,
            mfd: point_source().mfd,
            rupture: parameters(),
        };
        source.validate().expect("valid area source");
        let locations = source.locations().expect("grid");
        let ruptures: Vec<_> = source
            .iter_ruptures("Active Shallow Crust", tom())
            .expect("discretized area")
            .collect::<Result<_, _>>()
            .expect("ruptures");
        assert_eq!(ruptures.len(), locations.len());
        assert_eq!(source.count_ruptures().expect("count"), locations.len());
        let total: f64 = ruptures
            .iter()
            .filter_map(|rupture| rupture.occurrence().rate())
            .sum();
        assert!((total - 0.0009).abs() < 1.0e-12);
    }
}
