//! Writers for the outputs of a classical calculation.
//!
//! CSV output is one `hazard_curve-<IMT>.csv` per IMT for the mean curves
//! (`lon,lat,poe-<iml>...`), one file per quantile and per realization when
//! there is more than one, and `hazard_map.csv` when hazard map poes were
//! requested. JSON output is a single `hazard.json` holding everything.

use crate::calc::{ClassicalOutput, HazardCurves, HazardMaps};
use crate::domain::{ComputeResult, HazardError};
use crate::imt::Imtls;
use crate::site::SiteCollection;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = HazardError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(HazardError::configuration(
                "CONFIG.EXPORT_FORMAT",
                format!("unknown export format '{other}', expected csv or json"),
            )),
        }
    }
}

fn write_output(path: &Path, contents: &str) -> ComputeResult<()> {
    fs::write(path, contents).map_err(|source| {
        HazardError::io_system(
            "IO.EXPORT_WRITE",
            format!("failed to write '{}': {}", path.display(), source),
        )
    })
}

fn check_sites(curves: &HazardCurves, sites: &SiteCollection) -> ComputeResult<()> {
    if curves.num_sites() != sites.len() {
        return Err(HazardError::internal(
            "SYS.CURVES_SHAPE",
            format!(
                "{} rows of curves for {} sites",
                curves.num_sites(),
                sites.len()
            ),
        ));
    }
    Ok(())
}

/// CSV text of the curves of every IMT, keyed by IMT name.
pub fn hazard_curves_csv(
    curves: &HazardCurves,
    sites: &SiteCollection,
) -> ComputeResult<Vec<(String, String)>> {
    check_sites(curves, sites)?;
    let mut tables = Vec::with_capacity(curves.imtls().len());
    for ((imt, imls), (_, range)) in curves.imtls().iter().zip(curves.imtls().slices()) {
        let mut text = String::from("lon,lat");
        for iml in imls {
            text.push_str(&format!(",poe-{iml}"));
        }
        text.push('\n');
        for (site, (lon, lat)) in sites.lons().iter().zip(sites.lats()).enumerate() {
            text.push_str(&format!("{lon:.5},{lat:.5}"));
            for column in range.clone() {
                text.push_str(&format!(",{:.6e}", curves.poes()[(site, column)]));
            }
            text.push('\n');
        }
        tables.push((imt.to_string(), text));
    }
    Ok(tables)
}

/// CSV text with one `<IMT>-<poe>` column per IMT and poe.
pub fn hazard_map_csv(maps: &HazardMaps, sites: &SiteCollection) -> ComputeResult<String> {
    let mut text = String::from("lon,lat");
    for (imt, map) in maps.iter() {
        if map.nrows() != sites.len() {
            return Err(HazardError::internal(
                "SYS.CURVES_SHAPE",
                format!("{} rows of {imt} map for {} sites", map.nrows(), sites.len()),
            ));
        }
        for poe in maps.poes() {
            text.push_str(&format!(",{imt}-{poe}"));
        }
    }
    text.push('\n');
    for (site, (lon, lat)) in sites.lons().iter().zip(sites.lats()).enumerate() {
        text.push_str(&format!("{lon:.5},{lat:.5}"));
        for (_, map) in maps.iter() {
            for column in 0..map.ncols() {
                text.push_str(&format!(",{:.6e}", map[(site, column)]));
            }
        }
        text.push('\n');
    }
    Ok(text)
}

fn write_curve_tables(
    output_dir: &Path,
    prefix: &str,
    curves: &HazardCurves,
    sites: &SiteCollection,
) -> ComputeResult<Vec<PathBuf>> {
    hazard_curves_csv(curves, sites)?
        .into_iter()
        .map(|(imt, text)| {
            let path = output_dir.join(format!("{prefix}-{imt}.csv"));
            write_output(&path, &text)?;
            Ok(path)
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct SiteRecord {
    lon: f64,
    lat: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RealizationRecord<'a> {
    index: usize,
    weight: f64,
    gsims: &'a BTreeMap<String, &'static str>,
    curves: BTreeMap<String, Vec<Vec<f64>>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HazardDocument<'a> {
    imtls: &'a Imtls,
    sites: Vec<SiteRecord>,
    mean: BTreeMap<String, Vec<Vec<f64>>>,
    quantiles: BTreeMap<String, BTreeMap<String, Vec<Vec<f64>>>>,
    realizations: Vec<RealizationRecord<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hazard_maps: Option<BTreeMap<String, BTreeMap<String, Vec<f64>>>>,
}

fn curves_by_imt(curves: &HazardCurves) -> BTreeMap<String, Vec<Vec<f64>>> {
    curves
        .imtls()
        .imts()
        .map(|imt| {
            let rows = (0..curves.num_sites())
                .filter_map(|site| curves.curve(site, imt))
                .collect();
            (imt.to_string(), rows)
        })
        .collect()
}

fn maps_by_imt(maps: &HazardMaps) -> BTreeMap<String, BTreeMap<String, Vec<f64>>> {
    maps.iter()
        .map(|(imt, map)| {
            let by_poe = maps
                .poes()
                .iter()
                .enumerate()
                .map(|(column, poe)| {
                    let values = (0..map.nrows()).map(|site| map[(site, column)]).collect();
                    (poe.to_string(), values)
                })
                .collect();
            (imt.to_string(), by_poe)
        })
        .collect()
}

/// JSON text of a complete classical output.
pub fn classical_json(output: &ClassicalOutput, sites: &SiteCollection) -> ComputeResult<String> {
    check_sites(&output.mean, sites)?;
    let document = HazardDocument {
        imtls: output.mean.imtls(),
        sites: sites
            .lons()
            .iter()
            .zip(sites.lats())
            .map(|(lon, lat)| SiteRecord {
                lon: *lon,
                lat: *lat,
            })
            .collect(),
        mean: curves_by_imt(&output.mean),
        quantiles: output
            .quantiles
            .iter()
            .map(|(quantile, curves)| (quantile.to_string(), curves_by_imt(curves)))
            .collect(),
        realizations: output
            .realizations
            .iter()
            .map(|realization| RealizationRecord {
                index: realization.index,
                weight: realization.weight,
                gsims: &realization.gsims,
                curves: curves_by_imt(&realization.curves),
            })
            .collect(),
        hazard_maps: output.hazard_maps.as_ref().map(maps_by_imt),
    };
    serde_json::to_string_pretty(&document).map_err(|source| {
        HazardError::internal(
            "SYS.EXPORT_SERIALIZE",
            format!("failed to serialize hazard output: {source}"),
        )
    })
}

/// Writes `output` into `output_dir`, creating it when needed, and returns
/// the paths written.
pub fn export_classical(
    output: &ClassicalOutput,
    sites: &SiteCollection,
    output_dir: impl AsRef<Path>,
    format: ExportFormat,
) -> ComputeResult<Vec<PathBuf>> {
    let output_dir = output_dir.as_ref();
    fs::create_dir_all(output_dir).map_err(|source| {
        HazardError::io_system(
            "IO.OUTPUT_DIRECTORY",
            format!(
                "failed to create output directory '{}': {}",
                output_dir.display(),
                source
            ),
        )
    })?;

    let mut written = Vec::new();
    match format {
        ExportFormat::Json => {
            let path = output_dir.join("hazard.json");
            write_output(&path, &classical_json(output, sites)?)?;
            written.push(path);
        }
        ExportFormat::Csv => {
            written.extend(write_curve_tables(output_dir, "hazard_curve", &output.mean, sites)?);
            for (quantile, curves) in &output.quantiles {
                let prefix = format!("quantile_curve-{quantile}");
                written.extend(write_curve_tables(output_dir, &prefix, curves, sites)?);
            }
            if output.realizations.len() > 1 {
                for realization in &output.realizations {
                    let prefix = format!("hazard_curve-rlz-{:03}", realization.index);
                    written.extend(write_curve_tables(
                        output_dir,
                        &prefix,
                        &realization.curves,
                        sites,
                    )?);
                }
            }
            if let Some(maps) = &output.hazard_maps {
                let path = output_dir.join("hazard_map.csv");
                write_output(&path, &hazard_map_csv(maps, sites)?)?;
                written.push(path);
            }
        }
    }
    info!(
        output_dir = %output_dir.display(),
        format = format.as_str(),
        num_files = written.len(),
        "exported hazard outputs"
    );
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::{ExportFormat, export_classical, hazard_curves_csv};
    use crate::calc::{ClassicalOutput, HazardCurves, HazardMaps, Realization};
    use crate::geo::Point;
    use crate::imt::Imtls;
    use crate::site::{ReferenceSiteParameters, SiteCollection};
    use faer::Mat;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    fn sites() -> SiteCollection {
        SiteCollection::from_points(
            &[Point::surface(10.0, 45.0), Point::surface(10.5, 45.25)],
            ReferenceSiteParameters::default(),
        )
        .expect("sites")
    }

    fn curves() -> HazardCurves {
        let imtls = Imtls::parse([("PGA", vec![0.1, 0.2]), ("SA(1.0)", vec![0.05])]).expect("imtls");
        let poes = Mat::from_fn(2, 3, |site, level| 0.1 / (1 + site + level) as f64);
        HazardCurves::new(imtls, poes).expect("curves")
    }

    fn output(with_maps: bool) -> ClassicalOutput {
        let mean = curves();
        let hazard_maps = with_maps.then(|| HazardMaps::from_curves(&mean, &[0.02]).expect("maps"));
        ClassicalOutput {
            realizations: vec![Realization {
                index: 0,
                gsims: BTreeMap::from([("Active Shallow Crust".to_string(), "AkkarBommer2010")]),
                weight: 1.0,
                curves: mean.clone(),
            }],
            mean,
            quantiles: Vec::new(),
            hazard_maps,
        }
    }

    #[test]
    fn csv_tables_have_one_column_per_level() {
        let tables = hazard_curves_csv(&curves(), &sites()).expect("tables");
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].0, "PGA");
        let lines: Vec<&str> = tables[0].1.lines().collect();
        assert_eq!(lines[0], "lon,lat,poe-0.1,poe-0.2");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("10.00000,45.00000,1.000000e-1"));
        assert_eq!(tables[1].1.lines().next(), Some("lon,lat,poe-0.05"));
    }

    #[test]
    fn csv_export_writes_curves_and_maps() {
        let dir = TempDir::new().expect("tempdir");
        let written =
            export_classical(&output(true), &sites(), dir.path().join("out"), ExportFormat::Csv)
                .expect("export");
        let names: Vec<String> = written
            .iter()
            .filter_map(|path| path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            ["hazard_curve-PGA.csv", "hazard_curve-SA(1.0).csv", "hazard_map.csv"]
        );
        let map = fs::read_to_string(dir.path().join("out/hazard_map.csv")).expect("map");
        assert_eq!(map.lines().next(), Some("lon,lat,PGA-0.02,SA(1.0)-0.02"));
    }

    #[test]
    fn json_export_is_a_single_document() {
        let dir = TempDir::new().expect("tempdir");
        let written = export_classical(&output(false), &sites(), dir.path(), ExportFormat::Json)
            .expect("export");
        assert_eq!(written.len(), 1);
        let text = fs::read_to_string(&written[0]).expect("json");
        let value: serde_json::Value = serde_json::from_str(&text).expect("valid json");
        assert_eq!(value["sites"][1]["lat"], 45.25);
        assert_eq!(value["mean"]["PGA"][0][0], 0.1);
        assert_eq!(value["realizations"][0]["gsims"]["Active Shallow Crust"], "AkkarBommer2010");
        assert!(value.get("hazardMaps").is_none());
    }

    #[test]
    fn export_formats_parse() {
        assert_eq!("json".parse::<ExportFormat>().expect("json"), ExportFormat::Json);
        assert_eq!(
            "xml".parse::<ExportFormat>().expect_err("xml").placeholder(),
            "CONFIG.EXPORT_FORMAT"
        );
    }
}
