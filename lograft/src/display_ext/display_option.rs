use std::fmt;

/// Renders an optional log field: the value if it is set, `-` otherwise.
///
/// Positions, entries and leaders are unset until a node learns them, and log lines are easier
/// to scan with a short marker than with `None`.
pub(crate) struct DisplayOption<'a, T>(&'a Option<T>);

impl<T: fmt::Display> fmt::Display for DisplayOption<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(v) = self.0 {
            return v.fmt(f);
        }
        f.write_str("-")
    }
}

pub(crate) trait DisplayOptionExt<T> {
    fn display(&self) -> DisplayOption<'_, T>;
}

impl<T: fmt::Display> DisplayOptionExt<T> for Option<T> {
    fn display(&self) -> DisplayOption<'_, T> {
        DisplayOption(self)
    }
}
