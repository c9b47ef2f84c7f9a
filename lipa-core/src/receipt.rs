//! Receipt validation and rendering for 80mm thermal printers.
//!
//! Nothing is persisted: the caller prints what it gets back.

use crate::config::ReceiptConfig;
use lipa_sdk::objects::receipt::ReceiptData;
use thiserror::Error;

const ESC: u8 = 0x1B;
const GS: u8 = 0x1D;

const INIT: [u8; 2] = [ESC, b'@'];
const ALIGN_LEFT: [u8; 3] = [ESC, b'a', 0];
const ALIGN_CENTER: [u8; 3] = [ESC, b'a', 1];
const BOLD_ON: [u8; 3] = [ESC, b'E', 1];
const BOLD_OFF: [u8; 3] = [ESC, b'E', 0];
const DOUBLE_HEIGHT: [u8; 3] = [ESC, b'!', 0x10];
const NORMAL_SIZE: [u8; 3] = [ESC, b'!', 0];
const CUT: [u8; 3] = [GS, b'V', 0];

/// Narrowest layout that still fits the amount columns.
const MIN_WIDTH: usize = 24;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReceiptError {
    #[error("Invalid receipt data")]
    Invalid,
}

/// A receipt needs a number and at least one item.
pub fn validate(receipt: &ReceiptData) -> Result<(), ReceiptError> {
    if receipt.receipt_number.trim().is_empty() || receipt.items.is_empty() {
        return Err(ReceiptError::Invalid);
    }
    Ok(())
}

/// A receipt laid out as printable lines.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Layout {
    header: Vec<String>,
    body: Vec<String>,
    total: String,
    payment: Vec<String>,
    footer: Vec<String>,
}

fn layout(receipt: &ReceiptData, config: &ReceiptConfig) -> Layout {
    let width = config.paper_width.max(MIN_WIDTH);
    let heavy = "=".repeat(width);
    let light = "-".repeat(width);

    let header = vec![
        config.business_name.clone(),
        heavy.clone(),
        "RECEIPT".to_string(),
        heavy.clone(),
    ];

    let mut body = vec![
        format!("Receipt No: {}", receipt.receipt_number.trim()),
        format!("Date: {}", receipt.date),
    ];
    if let Some(customer) = receipt.customer_name.as_deref().filter(|c| !c.trim().is_empty()) {
        body.push(format!("Customer: {customer}"));
    }
    body.push(String::new());
    body.push("ITEMS:".to_string());
    body.push(light.clone());
    for item in &receipt.items {
        body.push(item.name.clone());
        body.push(format!(
            "  {} x {:.2} = {:.2}",
            item.quantity, item.price, item.total
        ));
    }
    body.push(light);
    body.push(columns("Subtotal:", &format!("{:.2}", receipt.subtotal), width));
    body.push(columns("Tax:", &format!("{:.2}", receipt.tax), width));

    let total = columns("TOTAL:", &format!("{:.2}", receipt.total), width);
    let payment = vec![format!("Payment: {}", receipt.payment_method), heavy];

    Layout {
        header,
        body,
        total,
        payment,
        footer: config.footer_lines.clone(),
    }
}

/// `label` on the left, `value` flush right.
fn columns(label: &str, value: &str, width: usize) -> String {
    let used = label.chars().count() + value.chars().count();
    let gap = width.saturating_sub(used).max(1);
    format!("{label}{}{value}", " ".repeat(gap))
}

fn center(line: &str, width: usize) -> String {
    let len = line.chars().count();
    if len >= width {
        return line.to_string();
    }
    format!("{}{line}", " ".repeat((width - len) / 2))
}

/// Plain-text rendering, one line per row, centered header and footer.
pub fn render_text(receipt: &ReceiptData, config: &ReceiptConfig) -> String {
    let width = config.paper_width.max(MIN_WIDTH);
    let layout = layout(receipt, config);

    let mut lines: Vec<String> = layout.header.iter().map(|l| center(l, width)).collect();
    lines.extend(layout.body);
    lines.push(layout.total);
    lines.extend(layout.payment);
    lines.extend(layout.footer.iter().map(|l| center(l, width)));

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

/// ESC/POS byte stream: init, centered bold double-height header,
/// left-aligned body, bold total, centered footer, feed and full cut.
pub fn render_escpos(receipt: &ReceiptData, config: &ReceiptConfig) -> Vec<u8> {
    let layout = layout(receipt, config);
    let mut out = Vec::with_capacity(1024);

    out.extend_from_slice(&INIT);

    out.extend_from_slice(&ALIGN_CENTER);
    out.extend_from_slice(&BOLD_ON);
    out.extend_from_slice(&DOUBLE_HEIGHT);
    for line in &layout.header {
        push_line(&mut out, line);
    }
    out.extend_from_slice(&NORMAL_SIZE);
    out.extend_from_slice(&BOLD_OFF);
    out.extend_from_slice(&ALIGN_LEFT);

    for line in &layout.body {
        push_line(&mut out, line);
    }

    out.extend_from_slice(&BOLD_ON);
    push_line(&mut out, &layout.total);
    out.extend_from_slice(&BOLD_OFF);

    for line in &layout.payment {
        push_line(&mut out, line);
    }

    out.extend_from_slice(&ALIGN_CENTER);
    for line in &layout.footer {
        push_line(&mut out, line);
    }
    out.extend_from_slice(&ALIGN_LEFT);

    out.extend_from_slice(b"\n\n\n");
    out.extend_from_slice(&CUT);
    out
}

/// Printers run a single-byte code page; anything outside ASCII prints
/// as `?`.
fn push_line(out: &mut Vec<u8>, line: &str) {
    out.extend(line.chars().map(|c| if c.is_ascii() { c as u8 } else { b'?' }));
    out.push(b'\n');
}
