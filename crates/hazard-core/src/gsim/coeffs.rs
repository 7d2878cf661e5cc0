use crate::domain::HazardError;
use crate::imt::Imt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoeffsTableError {
    #[error("first column in a table must be IMT")]
    MissingImtColumn,
    #[error("unknown IMT '{0}'")]
    UnknownImt(String),
    #[error("specify period as float value to declare SA IMT")]
    UnnamedSa,
    #[error("row '{imt}' has {found} coefficients, expected {expected}")]
    RowLength {
        imt: String,
        found: usize,
        expected: usize,
    },
    #[error("invalid coefficient '{0}'")]
    BadValue(String),
    #[error("no coefficients for {0}")]
    NotFound(String),
}

impl From<CoeffsTableError> for HazardError {
    fn from(error: CoeffsTableError) -> Self {
        match error {
            CoeffsTableError::NotFound(_) => {
                HazardError::configuration("CONFIG.GSIM_IMT", error.to_string())
            }
            _ => HazardError::internal("SYS.COEFFS_TABLE", error.to_string()),
        }
    }
}

/// One row of coefficients, in table column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Coeffs {
    names: Arc<[String]>,
    values: Vec<f64>,
}

impl Coeffs {
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|candidate| candidate == name)
            .map(|index| self.values[index])
    }
}

/// Coefficients keyed by IMT, parsed from a whitespace separated table
/// whose first column names the IMT (`pga`, `pgv`, `pgd`, `mmi`, or an SA
/// period). SA rows are interpolated in log-period between the closest
/// lower and higher periods; there is no extrapolation.
#[derive(Debug, Clone, PartialEq)]
pub struct CoeffsTable {
    sa_damping: f64,
    names: Arc<[String]>,
    sa_rows: Vec<(f64, Vec<f64>)>,
    other_rows: Vec<(Imt, Vec<f64>)>,
}

impl CoeffsTable {
    pub fn new(sa_damping: f64, table: &str) -> Result<Self, CoeffsTableError> {
        let mut lines = table
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty());
        let header: Vec<&str> = lines
            .next()
            .map(|line| line.split_whitespace().collect())
            .unwrap_or_default();
        if header.first().map(|name| name.to_uppercase()) != Some("IMT".to_string()) {
            return Err(CoeffsTableError::MissingImtColumn);
        }
        let names: Arc<[String]> = header[1..].iter().map(|name| name.to_string()).collect();

        let mut sa_rows = Vec::new();
        let mut other_rows = Vec::new();
        for line in lines {
            let mut fields = line.split_whitespace();
            let Some(imt_name) = fields.next() else {
                continue;
            };
            let imt_name = imt_name.to_uppercase();
            if imt_name == "SA" {
                return Err(CoeffsTableError::UnnamedSa);
            }
            let values = fields
                .map(|field| {
                    field
                        .parse::<f64>()
                        .map_err(|_| CoeffsTableError::BadValue(field.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            if values.len() != names.len() {
                return Err(CoeffsTableError::RowLength {
                    imt: imt_name,
                    found: values.len(),
                    expected: names.len(),
                });
            }
            match imt_name.parse::<f64>() {
                Ok(period) => sa_rows.push((period, values)),
                Err(_) => {
                    let imt = match imt_name.as_str() {
                        "PGA" => Imt::Pga,
                        "PGV" => Imt::Pgv,
                        "PGD" => Imt::Pgd,
                        "MMI" => Imt::Mmi,
                        _ => return Err(CoeffsTableError::UnknownImt(imt_name)),
                    };
                    other_rows.push((imt, values));
                }
            }
        }
        sa_rows.sort_by(|lhs, rhs| lhs.0.total_cmp(&rhs.0));
        Ok(Self {
            sa_damping,
            names,
            sa_rows,
            other_rows,
        })
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn sa_periods(&self) -> impl Iterator<Item = f64> + '_ {
        self.sa_rows.iter().map(|(period, _)| *period)
    }

    pub fn contains(&self, imt: &Imt) -> bool {
        self.get(imt).is_ok()
    }

    pub fn get(&self, imt: &Imt) -> Result<Coeffs, CoeffsTableError> {
        let not_found = || CoeffsTableError::NotFound(imt.to_string());
        let values = match imt {
            Imt::Sa { period, damping } => {
                if *damping != self.sa_damping {
                    return Err(not_found());
                }
                self.interpolate(*period).ok_or_else(not_found)?
            }
            other => self
                .other_rows
                .iter()
                .find(|(candidate, _)| candidate == other)
                .map(|(_, values)| values.clone())
                .ok_or_else(not_found)?,
        };
        Ok(Coeffs {
            names: Arc::clone(&self.names),
            values,
        })
    }

    fn interpolate(&self, period: f64) -> Option<Vec<f64>> {
        if let Some((_, values)) = self.sa_rows.iter().find(|(known, _)| *known == period) {
            return Some(values.clone());
        }
        let (below, low) = self
            .sa_rows
            .iter()
            .rev()
            .find(|(known, _)| *known < period)?;
        let (above, high) = self.sa_rows.iter().find(|(known, _)| *known > period)?;
        let ratio = (period.ln() - below.ln()) / (above.ln() - below.ln());
        Some(
            low.iter()
                .zip(high)
                .map(|(low, high)| low + (high - low) * ratio)
                .collect(),
        )
    }
}
