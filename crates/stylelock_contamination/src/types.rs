#[derive(Debug, Clone)]
pub struct FileReport {
    /// Candidate file, relative to the project root where possible.
    pub file: String,
    /// Distinct dirty selector group texts, in discovery order.
    pub dirty_selectors: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CheckResult {
    pub reports: Vec<FileReport>,
    pub files_checked: usize,
    /// Size of the immutable selector set the candidates were checked against.
    pub immutable_classes: usize,
}
