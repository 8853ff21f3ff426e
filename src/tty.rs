use crate::writer::Destination;

/// Decide whether level colors are used.
///
/// An explicit preference wins. Otherwise color only when the destination is
/// a terminal and `NO_COLOR` is not set.
pub fn should_use_colors(preference: Option<bool>, destination: &Destination) -> bool {
    preference.unwrap_or_else(|| destination.is_terminal() && std::env::var_os("NO_COLOR").is_none())
}
