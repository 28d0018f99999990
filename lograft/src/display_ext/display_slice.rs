use std::fmt;

/// Longest list rendered in full.
const SHOWN: usize = 5;

/// Renders a member list or a payload list on one log line.
///
/// Lists longer than 5 show their first 4 elements followed by the count of the rest:
/// `[1,2,3,4,+3]`.
pub(crate) struct DisplaySlice<'a, T>(&'a [T]);

impl<T: fmt::Display> fmt::Display for DisplaySlice<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (shown, hidden) = if self.0.len() > SHOWN {
            self.0.split_at(SHOWN - 1)
        } else {
            (self.0, &[][..])
        };

        f.write_str("[")?;
        for (i, t) in shown.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            t.fmt(f)?;
        }
        if !hidden.is_empty() {
            write!(f, ",+{}", hidden.len())?;
        }
        f.write_str("]")
    }
}

pub(crate) trait DisplaySliceExt<T> {
    fn display(&self) -> DisplaySlice<'_, T>;
}

impl<T: fmt::Display> DisplaySliceExt<T> for [T] {
    fn display(&self) -> DisplaySlice<'_, T> {
        DisplaySlice(self)
    }
}
