//! Console rendering of axis status snapshots.
//!
//! The polling loop hands out plain [`AxisStatus`] records; how they are
//! displayed is decided here, not in the driver.

use super::axis::AxisStatus;

/// Fixed-width status table, optionally redrawn in place.
///
/// The header is printed once. With overwriting enabled, every later
/// snapshot moves the cursor back up and redraws the axis rows instead of
/// scrolling.
pub struct ConsoleTable {
    overwrite: bool,
    drawn_once: bool,
}

impl ConsoleTable {
    pub fn new(overwrite: bool) -> Self {
        Self {
            overwrite,
            drawn_once: false,
        }
    }

    /// Print one snapshot, one row per axis.
    pub fn print(&mut self, statuses: &[AxisStatus]) {
        if !self.drawn_once {
            println!("{}", Self::header());
        } else if self.overwrite {
            print!("\x1b[{}A", statuses.len());
        }
        for status in statuses {
            println!("{}", Self::row(status));
        }
        self.drawn_once = true;
    }

    fn header() -> String {
        format!(
            "{:<7}{:<17}{:<19}{:<17}{:<19}{:<14}{}",
            "Axis", "Position", "Velocity", "Destination", "Des. velocity", "Travel time", "Done"
        )
    }

    fn row(status: &AxisStatus) -> String {
        format!(
            "{:<7}{:<17}{:<19}{:<17}{:<19}{:<14}{:>6.2} %",
            status.axis,
            Self::mm(status.position),
            Self::mm_per_s(status.velocity),
            Self::mm(status.destination),
            Self::mm_per_s(status.desired_velocity),
            Self::seconds(status.travel_time),
            status.fraction_done * 100.0,
        )
    }

    fn mm(value: Option<f64>) -> String {
        value.map_or_else(|| "-".to_string(), |v| format!("{v:.7} mm"))
    }

    fn mm_per_s(value: Option<f64>) -> String {
        value.map_or_else(|| "-".to_string(), |v| format!("{v:.7} mm/s"))
    }

    fn seconds(value: Option<f64>) -> String {
        value.map_or_else(|| "-".to_string(), |v| format!("{v:.2} s"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_status() -> AxisStatus {
        AxisStatus {
            axis: 1,
            position: Some(11.5),
            velocity: Some(0.05),
            destination: Some(23.0),
            desired_velocity: Some(0.05),
            travel_time: Some(460.0),
            fraction_done: 0.5,
            moving: true,
            powered: true,
            homed: true,
        }
    }

    #[test]
    fn test_row_renders_all_columns() {
        let row = ConsoleTable::row(&sample_status());
        assert!(row.starts_with('1'));
        assert!(row.contains("11.5000000 mm"));
        assert!(row.contains("0.0500000 mm/s"));
        assert!(row.contains("23.0000000 mm"));
        assert!(row.contains("460.00 s"));
        assert!(row.ends_with("50.00 %"));
    }

    #[test]
    fn test_unqueried_fields_render_as_dash() {
        let status = AxisStatus {
            position: None,
            velocity: None,
            destination: None,
            desired_velocity: None,
            travel_time: None,
            fraction_done: 0.0,
            moving: false,
            powered: false,
            homed: false,
            ..sample_status()
        };
        let row = ConsoleTable::row(&status);
        assert!(row.contains('-'));
        assert!(row.ends_with("0.00 %"));
    }

    #[test]
    fn test_header_names_every_column() {
        let header = ConsoleTable::header();
        for name in [
            "Axis",
            "Position",
            "Velocity",
            "Destination",
            "Des. velocity",
            "Travel time",
            "Done",
        ] {
            assert!(header.contains(name), "missing column {name:?}");
        }
    }
}
