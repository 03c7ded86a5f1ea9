/// Paging information carried by a window view over a result stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowStats {
    /// Index of the window's first result in the source stream.
    pub first: usize,
    /// Window size the caller asked for.
    pub requested: usize,
    /// Window size actually delivered, clamped to the available results.
    pub actual: usize,
    /// Whether results exist before the window.
    pub has_previous: bool,
    /// Whether results exist after the window.
    pub has_next: bool,
}
