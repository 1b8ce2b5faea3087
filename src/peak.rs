use serde::Serialize;

/// A peak with its prominence and key col (the saddle where it merges into
/// higher ground). The highest peak of a connected area has no col.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Peak {
    pub row: usize,
    pub col: usize,
    pub index: usize,
    pub elevation: f64,
    pub prominence: f64,
    pub col_row: Option<usize>,
    pub col_col: Option<usize>,
    pub col_elevation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

impl Peak {
    pub fn new(row: usize, col: usize, index: usize, elevation: f64) -> Self {
        Peak {
            row,
            col,
            index,
            elevation,
            prominence: 0.0,
            col_row: None,
            col_col: None,
            col_elevation: None,
            x: None,
            y: None,
        }
    }

    pub fn with_col(mut self, row: usize, col: usize, elevation: f64) -> Self {
        self.col_row = Some(row);
        self.col_col = Some(col);
        self.col_elevation = Some(elevation);
        self
    }

    pub fn with_prominence(mut self, prominence: f64) -> Self {
        self.prominence = prominence;
        self
    }

    pub fn with_location(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn has_col(&self) -> bool {
        self.col_elevation.is_some()
    }
}

impl std::fmt::Display for Peak {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (crow_str, ccol_str, celev_str) = match (self.col_row, self.col_col, self.col_elevation) {
            (Some(crow), Some(ccol), Some(celev)) => {
                (format!("{:6}", crow), format!("{:6}", ccol), format!("{:8.1}", celev))
            }
            _ => ("    NA".to_string(), "    NA".to_string(), "      NA".to_string()),
        };

        write!(
            f,
            "{:8.1} {:6} {:6} {:8.1} {} {} {}",
            self.prominence, self.row, self.col, self.elevation, crow_str, ccol_str, celev_str
        )
    }
}
