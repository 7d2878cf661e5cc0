//! Boore and Atkinson (2008) NGA ground-motion prediction equation.
//!
//! Natural-log mean of PGA, SA (g) or PGV (cm/s) as the sum of magnitude,
//! distance and site terms; the nonlinear site term depends on the
//! rock PGA (`pga4nl`) predicted for the same rupture.

use super::{CoeffsTable, CoeffsTableError, Gsim};
use crate::contexts::Contexts;
use crate::domain::{ComputeResult, HazardError};
use crate::imt::Imt;
use std::sync::OnceLock;

const COEFFS_TABLE: &str = "
IMT     c1       c2       c3      h     e1       e2       e3       e4      e5       e6      e7      Mh   sigma tau   std
pgv    -0.87370  0.10060 -0.00334 2.54  5.00121  5.04727  4.63188  5.08210 0.18322 -0.12736 0.00000 8.50 0.500 0.256 0.560
pga    -0.66050  0.11970 -0.01151 1.35 -0.53804 -0.50350 -0.75472 -0.50970 0.28805 -0.10164 0.00000 6.75 0.502 0.260 0.564
0.010  -0.66220  0.12000 -0.01151 1.35 -0.52883 -0.49429 -0.74551 -0.49966 0.28897 -0.10019 0.00000 6.75 0.502 0.262 0.566
0.020  -0.66600  0.12280 -0.01151 1.35 -0.52192 -0.48508 -0.73906 -0.48895 0.25144 -0.11006 0.00000 6.75 0.502 0.262 0.566
0.030  -0.69010  0.12830 -0.01151 1.35 -0.45285 -0.41831 -0.66722 -0.42229 0.17976 -0.12858 0.00000 6.75 0.507 0.274 0.576
0.050  -0.71700  0.13170 -0.01151 1.35 -0.28476 -0.25022 -0.48462 -0.26092 0.06369 -0.15752 0.00000 6.75 0.516 0.286 0.589
0.075  -0.72050  0.12370 -0.01151 1.55  0.00767  0.04912 -0.20578  0.02706 0.01170 -0.17051 0.00000 6.75 0.513 0.320 0.606
0.10   -0.70810  0.11170 -0.01151 1.68  0.20109  0.23102  0.03058  0.22193 0.04697 -0.15948 0.00000 6.75 0.520 0.318 0.608
0.15   -0.69610  0.09884 -0.01113 1.86  0.46128  0.48661  0.30185  0.49328 0.17990 -0.14539 0.00000 6.75 0.518 0.290 0.594
0.20   -0.58300  0.04273 -0.00952 1.98  0.57180  0.59253  0.40860  0.61472 0.52729 -0.12964 0.00102 6.75 0.523 0.288 0.596
0.25   -0.57260  0.02977 -0.00837 2.07  0.51884  0.53496  0.33880  0.57747 0.60880 -0.13843 0.08607 6.75 0.527 0.267 0.592
0.30   -0.55430  0.01955 -0.00750 2.14  0.43825  0.44516  0.25356  0.51990 0.64472 -0.15694 0.10601 6.75 0.546 0.269 0.608
0.40   -0.64430  0.04394 -0.00626 2.24  0.39220  0.40602  0.21398  0.46080 0.78610 -0.07843 0.02262 6.75 0.541 0.267 0.603
0.50   -0.69140  0.06080 -0.00540 2.32  0.18957  0.19878  0.00967  0.26337 0.76837 -0.09054 0.00000 6.75 0.555 0.265 0.615
0.75   -0.74080  0.07518 -0.00409 2.46 -0.21338 -0.19496 -0.49176 -0.10813 0.75179 -0.14053 0.10302 6.75 0.571 0.299 0.645
1.0    -0.81830  0.10270 -0.00334 2.54 -0.46896 -0.43443 -0.78465 -0.39330 0.67880 -0.18257 0.05393 6.75 0.573 0.302 0.647
1.5    -0.83030  0.09793 -0.00255 2.66 -0.86271 -0.79593 -1.20902 -0.88085 0.70689 -0.25950 0.19082 6.75 0.566 0.373 0.679
2.0    -0.82850  0.09432 -0.00217 2.73 -1.22652 -1.15514 -1.57697 -1.27669 0.77989 -0.29657 0.29888 6.75 0.580 0.389 0.700
3.0    -0.78440  0.07282 -0.00191 2.83 -1.82979 -1.74690 -2.22584 -1.91814 0.77966 -0.45384 0.67466 6.75 0.566 0.401 0.695
4.0    -0.68540  0.03758 -0.00191 2.89 -2.24656 -2.15906 -2.58228 -2.38168 1.24961 -0.35874 0.79508 6.75 0.583 0.385 0.698
5.0    -0.50960 -0.02391 -0.00191 2.93 -1.28408 -1.21270 -1.50904 -1.41093 0.14271 -0.39006 0.00000 8.50 0.601 0.437 0.744
7.5    -0.37240 -0.06568 -0.00191 3.00 -1.43145 -1.31632 -1.81022 -1.59217 0.52407 -0.37578 0.00000 8.50 0.626 0.477 0.787
10.0   -0.09824 -0.13800 -0.00191 3.04 -2.15446 -2.16137 -2.53323 -2.14635 0.40387 -0.48492 0.00000 8.50 0.645 0.477 0.801
";

const SOIL_RESPONSE_TABLE: &str = "
IMT     blin    b1      b2
pgv    -0.60   -0.50   -0.06
pga    -0.36   -0.64   -0.14
0.010  -0.36   -0.64   -0.14
0.020  -0.34   -0.63   -0.12
0.030  -0.33   -0.62   -0.11
0.040  -0.31   -0.61   -0.11
0.050  -0.29   -0.64   -0.11
0.060  -0.25   -0.64   -0.11
0.075  -0.23   -0.64   -0.11
0.090  -0.23   -0.64   -0.12
0.100  -0.25   -0.60   -0.13
0.120  -0.26   -0.56   -0.14
0.150  -0.28   -0.53   -0.18
0.170  -0.29   -0.53   -0.19
0.200  -0.31   -0.52   -0.19
0.240  -0.38   -0.52   -0.16
0.250  -0.39   -0.52   -0.16
0.300  -0.44   -0.52   -0.14
0.360  -0.48   -0.51   -0.11
0.400  -0.50   -0.51   -0.10
0.460  -0.55   -0.50   -0.08
0.500  -0.60   -0.50   -0.06
0.600  -0.66   -0.49   -0.03
0.750  -0.69   -0.47   -0.00
0.850  -0.69   -0.46   -0.00
1.000  -0.70   -0.44   -0.00
1.500  -0.72   -0.40   -0.00
2.000  -0.73   -0.38   -0.00
3.000  -0.74   -0.34   -0.00
4.000  -0.75   -0.31   -0.00
5.000  -0.75   -0.291  -0.00
7.500  -0.692  -0.247  -0.00
10.00  -0.650  -0.215  -0.00
";

const REFERENCE_MAGNITUDE: f64 = 4.5;
const REFERENCE_VS30: f64 = 760.0;

static COEFFS: OnceLock<Result<CoeffsTable, CoeffsTableError>> = OnceLock::new();
static SOIL_RESPONSE: OnceLock<Result<CoeffsTable, CoeffsTableError>> = OnceLock::new();

fn table(
    cell: &'static OnceLock<Result<CoeffsTable, CoeffsTableError>>,
    text: &'static str,
) -> ComputeResult<&'static CoeffsTable> {
    cell.get_or_init(|| CoeffsTable::new(5.0, text))
        .as_ref()
        .map_err(|error| HazardError::from(error.clone()))
}

fn row_length_error(imt: &Imt) -> HazardError {
    HazardError::internal(
        "SYS.COEFFS_TABLE",
        format!("unexpected coefficient row length for {imt}"),
    )
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ScalingCoeffs {
    c1: f64,
    c2: f64,
    c3: f64,
    h: f64,
    e: [f64; 7],
    mh: f64,
    std: f64,
}

impl ScalingCoeffs {
    fn for_imt(imt: &Imt) -> ComputeResult<Self> {
        let coeffs = table(&COEFFS, COEFFS_TABLE)?.get(imt)?;
        let &[c1, c2, c3, h, e1, e2, e3, e4, e5, e6, e7, mh, _sigma, _tau, std] = coeffs.values()
        else {
            return Err(row_length_error(imt));
        };
        Ok(Self {
            c1,
            c2,
            c3,
            h,
            e: [e1, e2, e3, e4, e5, e6, e7],
            mh,
            std,
        })
    }

    fn magnitude_scaling(&self, mag: f64, rake: f64) -> f64 {
        let [_e1, e2, e3, e4, e5, e6, e7] = self.e;
        let mechanism = match FaultType::from_rake(rake) {
            FaultType::StrikeSlip => e2,
            FaultType::Normal => e3,
            FaultType::Reverse => e4,
        };
        let delta = mag - self.mh;
        if mag <= self.mh {
            mechanism + e5 * delta + e6 * delta * delta
        } else {
            mechanism + e7 * delta
        }
    }

    fn distance_scaling(&self, mag: f64, rjb: f64) -> f64 {
        let r = (rjb * rjb + self.h * self.h).sqrt();
        (self.c1 + self.c2 * (mag - REFERENCE_MAGNITUDE)) * r.ln() + self.c3 * (r - 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FaultType {
    StrikeSlip,
    Normal,
    Reverse,
}

impl FaultType {
    /// Within 30 degrees of horizontal is strike-slip, 30 to 150 reverse,
    /// -30 to -150 normal.
    fn from_rake(rake: f64) -> Self {
        if rake.abs() <= 30.0 || 180.0 - rake.abs() <= 30.0 {
            Self::StrikeSlip
        } else if rake > 30.0 && rake < 150.0 {
            Self::Reverse
        } else {
            Self::Normal
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct SoilResponse {
    blin: f64,
    b1: f64,
    b2: f64,
}

impl SoilResponse {
    fn for_imt(imt: &Imt) -> ComputeResult<Self> {
        let coeffs = table(&SOIL_RESPONSE, SOIL_RESPONSE_TABLE)?.get(imt)?;
        let &[blin, b1, b2] = coeffs.values() else {
            return Err(row_length_error(imt));
        };
        Ok(Self { blin, b1, b2 })
    }

    fn linear(&self, vs30: f64) -> f64 {
        self.blin * (vs30 / REFERENCE_VS30).ln()
    }

    fn nonlinear_slope(&self, vs30: f64) -> f64 {
        const V1: f64 = 180.0;
        const V2: f64 = 300.0;
        if vs30 <= V1 {
            self.b1
        } else if vs30 <= V2 {
            (self.b1 - self.b2) * (vs30 / V2).ln() / (V1 / V2).ln() + self.b2
        } else if vs30 < REFERENCE_VS30 {
            self.b2 * (vs30 / REFERENCE_VS30).ln() / (V2 / REFERENCE_VS30).ln()
        } else {
            0.0
        }
    }

    fn nonlinear(&self, vs30: f64, pga4nl: f64) -> f64 {
        const A1: f64 = 0.03;
        const A2: f64 = 0.09;
        const PGA_LOW: f64 = 0.06;
        let bnl = self.nonlinear_slope(vs30);
        if pga4nl <= A1 {
            bnl * (PGA_LOW / 0.1).ln()
        } else if pga4nl <= A2 {
            let dx = (A2 / A1).ln();
            let dy = bnl * (A2 / PGA_LOW).ln();
            let c = (3.0 * dy - bnl * dx) / (dx * dx);
            let d = -(2.0 * dy - bnl * dx) / (dx * dx * dx);
            let excess = (pga4nl / A1).ln();
            bnl * (PGA_LOW / 0.1).ln() + c * excess.powi(2) + d * excess.powi(3)
        } else {
            bnl * (pga4nl / 0.1).ln()
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BooreAtkinson2008;

impl Gsim for BooreAtkinson2008 {
    fn name(&self) -> &'static str {
        "BooreAtkinson2008"
    }

    fn requires_sites_parameters(&self) -> &'static [&'static str] {
        &["vs30"]
    }

    fn requires_rupture_parameters(&self) -> &'static [&'static str] {
        &["mag", "rake"]
    }

    fn requires_distances(&self) -> &'static [&'static str] {
        &["rjb"]
    }

    fn supports_imt(&self, imt: &Imt) -> bool {
        matches!(imt, Imt::Pga | Imt::Pgv | Imt::Sa { .. })
            && ScalingCoeffs::for_imt(imt).is_ok()
            && SoilResponse::for_imt(imt).is_ok()
    }

    fn mean_and_stddev(
        &self,
        contexts: &Contexts,
        imt: &Imt,
    ) -> ComputeResult<(Vec<f64>, Vec<f64>)> {
        let scaling = ScalingCoeffs::for_imt(imt)?;
        let soil = SoilResponse::for_imt(imt)?;
        let rock = ScalingCoeffs::for_imt(&Imt::Pga)?;
        let mag = contexts.rupture.require("mag")?;
        let rake = contexts.rupture.require("rake")?;
        let vs30 = contexts.sites.require("vs30")?;
        let rjb = contexts.distances.require("rjb")?;

        let rock_magnitude = rock.magnitude_scaling(mag, rake);
        let magnitude = scaling.magnitude_scaling(mag, rake);
        let mean = vs30
            .iter()
            .zip(rjb)
            .map(|(vs30, rjb)| {
                let pga4nl = (rock_magnitude + rock.distance_scaling(mag, *rjb)).exp();
                let site = soil.linear(*vs30) + soil.nonlinear(*vs30, pga4nl);
                match imt {
                    Imt::Pga => pga4nl.ln() + site,
                    _ => magnitude + scaling.distance_scaling(mag, *rjb) + site,
                }
            })
            .collect();
        Ok((mean, vec![scaling.std; vs30.len()]))
    }
}

#[cfg(test)]
mod tests {
    use super::{BooreAtkinson2008, FaultType, SoilResponse};
    use crate::contexts::{Contexts, DistancesContext, RuptureContext, SitesContext};
    use crate::gsim::Gsim;
    use crate::imt::Imt;

    fn contexts(mag: f64, rake: f64, vs30: Vec<f64>, rjb: Vec<f64>) -> Contexts {
        Contexts {
            sites: SitesContext::default().with_parameter("vs30", vs30),
            rupture: RuptureContext::default()
                .with_parameter("mag", mag)
                .with_parameter("rake", rake),
            distances: DistancesContext::default().with_distance("rjb", rjb),
        }
    }

    #[test]
    fn rake_selects_fault_type() {
        assert_eq!(FaultType::from_rake(0.0), FaultType::StrikeSlip);
        assert_eq!(FaultType::from_rake(-170.0), FaultType::StrikeSlip);
        assert_eq!(FaultType::from_rake(90.0), FaultType::Reverse);
        assert_eq!(FaultType::from_rake(-90.0), FaultType::Normal);
    }

    #[test]
    fn nonlinear_slope_is_continuous_at_breakpoints() {
        let soil = SoilResponse::for_imt(&Imt::Pga).expect("pga soil coefficients");
        assert!((soil.nonlinear_slope(180.0) - soil.b1).abs() < 1.0e-12);
        assert!((soil.nonlinear_slope(300.0) - soil.b2).abs() < 1.0e-12);
        assert!(soil.nonlinear_slope(759.999).abs() < 1.0e-4);
        assert_eq!(soil.nonlinear_slope(900.0), 0.0);
        let below = soil.nonlinear(250.0, 0.09 - 1.0e-9);
        let above = soil.nonlinear(250.0, 0.09 + 1.0e-9);
        assert!((below - above).abs() < 1.0e-6);
    }

    #[test]
    fn reference_rock_pga_has_no_site_term() {
        let gsim = BooreAtkinson2008;
        let (mean, stddev) = gsim
            .mean_and_stddev(&contexts(6.0, 0.0, vec![760.0], vec![10.0]), &Imt::Pga)
            .expect("pga mean");
        let r = (100.0_f64 + 1.35 * 1.35).sqrt();
        let expected = -0.50350 + 0.28805 * (6.0 - 6.75) - 0.10164 * 0.75 * 0.75
            + (-0.66050 + 0.11970 * 1.5) * r.ln()
            - 0.01151 * (r - 1.0);
        assert!((mean[0] - expected).abs() < 1.0e-10);
        assert_eq!(stddev, vec![0.564]);
    }

    #[test]
    fn softer_sites_amplify_long_period_motion() {
        let gsim = BooreAtkinson2008;
        let (mean, _) = gsim
            .mean_and_stddev(
                &contexts(6.5, 90.0, vec![250.0, 760.0], vec![30.0, 30.0]),
                &Imt::sa(1.0),
            )
            .expect("sa mean");
        assert!(mean[0] > mean[1]);
        assert!(gsim.supports_imt(&Imt::sa(10.0)));
        assert!(!gsim.supports_imt(&Imt::sa(12.0)));
    }
}
