//! Sites and the columnar, read-only site collection shared by every task.

use crate::domain::{ConfigResult, HazardError};
use crate::geo::Point;
use faer::Mat;
use std::sync::Arc;

pub const SITE_PARAMETERS: [&str; 8] = [
    "lon",
    "lat",
    "depth",
    "vs30",
    "vs30measured",
    "z1pt0",
    "z2pt5",
    "backarc",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Site {
    pub location: Point,
    pub vs30: f64,
    pub vs30measured: bool,
    pub z1pt0: f64,
    pub z2pt5: f64,
    pub backarc: bool,
}

impl Site {
    pub fn new(
        location: Point,
        vs30: f64,
        vs30measured: bool,
        z1pt0: f64,
        z2pt5: f64,
        backarc: bool,
    ) -> ConfigResult<Self> {
        for (name, value) in [("vs30", vs30), ("z1pt0", z1pt0), ("z2pt5", z2pt5)] {
            if !(value > 0.0) {
                return Err(HazardError::configuration(
                    "CONFIG.SITE",
                    format!("{name} must be positive, got {value}"),
                ));
            }
        }
        Ok(Self {
            location,
            vs30,
            vs30measured,
            z1pt0,
            z2pt5,
            backarc,
        })
    }
}

/// Site parameters applied to every point of [`SiteCollection::from_points`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceSiteParameters {
    pub vs30: f64,
    pub vs30measured: bool,
    pub z1pt0: f64,
    pub z2pt5: f64,
    pub backarc: bool,
}

impl Default for ReferenceSiteParameters {
    fn default() -> Self {
        Self {
            vs30: 760.0,
            vs30measured: false,
            z1pt0: 40.0,
            z2pt5: 1.0,
            backarc: false,
        }
    }
}

/// Ordered set of sites stored column by column.
///
/// Columns are reference counted, so clones and the "everything selected"
/// filter result share storage. `sids` are positions in the complete
/// collection the instance was derived from, which is what lets per-site
/// results be expanded back to the complete ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteCollection {
    sids: Arc<[usize]>,
    lons: Arc<[f64]>,
    lats: Arc<[f64]>,
    depths: Arc<[f64]>,
    vs30: Arc<[f64]>,
    vs30measured: Arc<[bool]>,
    z1pt0: Arc<[f64]>,
    z2pt5: Arc<[f64]>,
    backarc: Arc<[bool]>,
    complete_len: usize,
}

impl SiteCollection {
    pub fn new(sites: &[Site]) -> ConfigResult<Self> {
        if sites.is_empty() {
            return Err(HazardError::configuration(
                "CONFIG.SITE",
                "site collection cannot be empty",
            ));
        }
        let column = |value: fn(&Site) -> f64| -> Arc<[f64]> { sites.iter().map(value).collect() };
        Ok(Self {
            sids: (0..sites.len()).collect(),
            lons: column(|site| site.location.lon),
            lats: column(|site| site.location.lat),
            depths: column(|site| site.location.depth),
            vs30: column(|site| site.vs30),
            vs30measured: sites.iter().map(|site| site.vs30measured).collect(),
            z1pt0: column(|site| site.z1pt0),
            z2pt5: column(|site| site.z2pt5),
            backarc: sites.iter().map(|site| site.backarc).collect(),
            complete_len: sites.len(),
        })
    }

    pub fn from_points(
        points: &[Point],
        reference: ReferenceSiteParameters,
    ) -> ConfigResult<Self> {
        let sites = points
            .iter()
            .map(|point| {
                Site::new(
                    *point,
                    reference.vs30,
                    reference.vs30measured,
                    reference.z1pt0,
                    reference.z2pt5,
                    reference.backarc,
                )
            })
            .collect::<ConfigResult<Vec<_>>>()?;
        Self::new(&sites)
    }

    pub fn len(&self) -> usize {
        self.sids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sids.is_empty()
    }

    /// Number of sites in the complete collection this one derives from.
    pub fn complete_len(&self) -> usize {
        self.complete_len
    }

    pub fn is_complete(&self) -> bool {
        self.len() == self.complete_len
    }

    pub fn sids(&self) -> &[usize] {
        &self.sids
    }

    /// Alias of [`Self::sids`]: the positions in the complete collection.
    pub fn indices(&self) -> &[usize] {
        &self.sids
    }

    pub fn lons(&self) -> &[f64] {
        &self.lons
    }

    pub fn lats(&self) -> &[f64] {
        &self.lats
    }

    pub fn depths(&self) -> &[f64] {
        &self.depths
    }

    pub fn vs30(&self) -> &[f64] {
        &self.vs30
    }

    pub fn vs30measured(&self) -> &[bool] {
        &self.vs30measured
    }

    pub fn z1pt0(&self) -> &[f64] {
        &self.z1pt0
    }

    pub fn z2pt5(&self) -> &[f64] {
        &self.z2pt5
    }

    pub fn backarc(&self) -> &[bool] {
        &self.backarc
    }

    pub fn location(&self, index: usize) -> Point {
        Point::new(self.lons[index], self.lats[index], self.depths[index])
    }

    pub fn locations(&self) -> impl Iterator<Item = Point> + '_ {
        (0..self.len()).map(|index| self.location(index))
    }

    /// Values of a named site parameter, booleans as 0/1.
    pub fn parameter(&self, name: &str) -> Option<Vec<f64>> {
        let flags = |values: &[bool]| values.iter().map(|flag| f64::from(u8::from(*flag))).collect();
        match name {
            "lon" => Some(self.lons.to_vec()),
            "lat" => Some(self.lats.to_vec()),
            "depth" => Some(self.depths.to_vec()),
            "vs30" => Some(self.vs30.to_vec()),
            "vs30measured" => Some(flags(&self.vs30measured)),
            "z1pt0" => Some(self.z1pt0.to_vec()),
            "z2pt5" => Some(self.z2pt5.to_vec()),
            "backarc" => Some(flags(&self.backarc)),
            _ => None,
        }
    }

    /// Subset selected by `mask`: `None` when nothing is selected, a
    /// storage-sharing clone when everything is. Filtering a filtered
    /// collection keeps the positions in the complete collection.
    pub fn filter(&self, mask: &[bool]) -> Option<SiteCollection> {
        debug_assert_eq!(mask.len(), self.len());
        let selected: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(index, keep)| keep.then_some(index))
            .collect();
        if selected.is_empty() {
            return None;
        }
        if selected.len() == self.len() {
            return Some(self.clone());
        }
        fn pick<T: Copy>(values: &[T], selected: &[usize]) -> Arc<[T]> {
            selected.iter().map(|index| values[*index]).collect()
        }
        Some(Self {
            sids: pick(&self.sids, &selected),
            lons: pick(&self.lons, &selected),
            lats: pick(&self.lats, &selected),
            depths: pick(&self.depths, &selected),
            vs30: pick(&self.vs30, &selected),
            vs30measured: pick(&self.vs30measured, &selected),
            z1pt0: pick(&self.z1pt0, &selected),
            z2pt5: pick(&self.z2pt5, &selected),
            backarc: pick(&self.backarc, &selected),
            complete_len: self.complete_len,
        })
    }

    /// Scatters one value per site of this collection into an array over
    /// the complete collection, using `placeholder` elsewhere.
    pub fn expand(&self, values: &[f64], placeholder: f64) -> Vec<f64> {
        debug_assert_eq!(values.len(), self.len());
        let mut expanded = vec![placeholder; self.complete_len];
        for (sid, value) in self.sids.iter().zip(values) {
            expanded[*sid] = *value;
        }
        expanded
    }

    /// Row-wise variant of [`Self::expand`] for sites x levels matrices.
    pub fn expand_rows(&self, values: &Mat<f64>, placeholder: f64) -> Mat<f64> {
        debug_assert_eq!(values.nrows(), self.len());
        let mut expanded = Mat::from_fn(self.complete_len, values.ncols(), |_, _| placeholder);
        for (row, sid) in self.sids.iter().enumerate() {
            for column in 0..values.ncols() {
                expanded[(*sid, column)] = values[(row, column)];
            }
        }
        expanded
    }
}

#[cfg(test)]
mod tests {
    use super::{ReferenceSiteParameters, Site, SiteCollection};
    use crate::geo::Point;
    use faer::Mat;

    fn collection() -> SiteCollection {
        let points: Vec<Point> = (0..5).map(|i| Point::surface(i as f64, 0.0)).collect();
        SiteCollection::from_points(&points, ReferenceSiteParameters::default())
            .expect("collection")
    }

    #[test]
    fn site_validation_rejects_non_positive_parameters() {
        let location = Point::surface(0.0, 0.0);
        assert!(Site::new(location, 0.0, false, 40.0, 1.0, false).is_err());
        assert!(Site::new(location, 760.0, false, -1.0, 1.0, false).is_err());
        assert!(SiteCollection::new(&[]).is_err());
    }

    #[test]
    fn filter_returns_none_all_or_subset() {
        let sites = collection();
        assert!(sites.filter(&[false; 5]).is_none());
        let all = sites.filter(&[true; 5]).expect("all selected");
        assert_eq!(all, sites);
        let subset = sites
            .filter(&[true, false, true, false, true])
            .expect("subset");
        assert_eq!(subset.sids(), &[0, 2, 4]);
        assert_eq!(subset.lons(), &[0.0, 2.0, 4.0]);
        assert_eq!(subset.complete_len(), 5);
        assert!(!subset.is_complete());
    }

    #[test]
    fn filtering_composes_index_maps() {
        let sites = collection();
        let first = sites
            .filter(&[false, true, true, true, true])
            .expect("first");
        let second = first.filter(&[true, false, true, false]).expect("second");
        assert_eq!(second.indices(), &[1, 3]);
        assert_eq!(second.lons(), &[1.0, 3.0]);
    }

    #[test]
    fn expand_fills_placeholders() {
        let sites = collection();
        let subset = sites
            .filter(&[false, true, false, true, false])
            .expect("subset");
        assert_eq!(
            subset.expand(&[0.5, 0.25], 1.0),
            vec![1.0, 0.5, 1.0, 0.25, 1.0]
        );
        let matrix = Mat::from_fn(2, 2, |row, column| (row * 2 + column) as f64);
        let expanded = subset.expand_rows(&matrix, 1.0);
        assert_eq!(expanded.nrows(), 5);
        assert_eq!(expanded[(1, 1)], 1.0);
        assert_eq!(expanded[(3, 0)], 2.0);
        assert_eq!(expanded[(0, 0)], 1.0);
    }

    #[test]
    fn parameters_are_exposed_by_name() {
        let sites = collection();
        assert_eq!(sites.parameter("vs30"), Some(vec![760.0; 5]));
        assert_eq!(sites.parameter("backarc"), Some(vec![0.0; 5]));
        assert_eq!(sites.parameter("kappa"), None);
    }
}
