/// Branding and layout for printed receipts.
#[derive(Debug, Clone)]
pub struct ReceiptConfig {
    pub business_name: String,
    pub footer_lines: Vec<String>,
    /// Characters per line (48 for 80mm paper).
    pub paper_width: usize,
}

impl Default for ReceiptConfig {
    fn default() -> Self {
        Self {
            business_name: "LIPA".to_string(),
            footer_lines: vec![
                "Thank you for your business!".to_string(),
                "Visit us again".to_string(),
            ],
            paper_width: 48,
        }
    }
}
