/// Printable payment receipts
///
/// Rendering is a pure function of the receipt read model and the gym's
/// branding; the HTTP layer looks up the view and serves the document.
use crate::{config::BrandingConfig, payments::ReceiptView};
use rust_decimal::Decimal;
use std::fmt::Write;

const STYLE: &str = r#"
body { font-family: Arial, Helvetica, sans-serif; color: #222; margin: 0; padding: 24px; }
.receipt { max-width: 720px; margin: 0 auto; border: 1px solid #ddd; padding: 32px; }
.header { display: flex; justify-content: space-between; border-bottom: 2px solid #222; padding-bottom: 16px; }
.header h1 { margin: 0; font-size: 24px; }
.muted { color: #666; font-size: 13px; }
.section { margin-top: 24px; }
.section h2 { font-size: 15px; text-transform: uppercase; color: #555; margin-bottom: 8px; }
table { width: 100%; border-collapse: collapse; margin-top: 8px; }
th, td { text-align: left; padding: 8px; border-bottom: 1px solid #eee; }
td.amount, th.amount { text-align: right; }
.total td { font-weight: bold; border-top: 2px solid #222; }
.footer { margin-top: 32px; text-align: center; color: #666; font-size: 13px; }
@media print { body { padding: 0; } .receipt { border: none; } }
"#;

/// Render a receipt as a standalone HTML document
pub fn render_receipt_html(view: &ReceiptView, branding: &BrandingConfig) -> String {
    let gym_name = escape_html(&branding.gym_name);
    let amount = format_money(view.amount, &branding.currency_symbol);
    let duration = view
        .plan_duration_days
        .map(|days| format!("{} days", days))
        .unwrap_or_else(|| "N/A".to_string());

    let mut contact = String::new();
    for line in [&branding.address, &branding.phone].into_iter().flatten() {
        let _ = write!(contact, "<div class=\"muted\">{}</div>", escape_html(line));
    }

    let plan_row = view
        .plan_name
        .as_deref()
        .map(|name| format!("<div><strong>Plan:</strong> {}</div>", escape_html(name)))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Receipt {receipt}</title>
<style>{style}</style>
</head>
<body>
<div class="receipt">
  <div class="header">
    <div>
      <h1>{gym_name}</h1>
      {contact}
    </div>
    <div>
      <div><strong>Receipt #:</strong> {receipt}</div>
      <div><strong>Date:</strong> {date}</div>
    </div>
  </div>
  <div class="section">
    <h2>Billed To</h2>
    <div><strong>{member_name}</strong></div>
    <div>Member ID: {member_code}</div>
    <div>{member_email}</div>
    <div>{member_phone}</div>
    {plan_row}
  </div>
  <div class="section">
    <h2>Payment Details</h2>
    <table>
      <thead>
        <tr><th>Description</th><th>Duration</th><th class="amount">Amount</th></tr>
      </thead>
      <tbody>
        <tr><td>{description}</td><td>{duration}</td><td class="amount">{amount}</td></tr>
        <tr class="total"><td colspan="2">Total Paid</td><td class="amount">{amount}</td></tr>
      </tbody>
    </table>
    <p><strong>Payment Method:</strong> {method}</p>
  </div>
  <div class="footer">
    <div>Issued by: {issued_by}</div>
    <div>Thank you for training with {gym_name}!</div>
  </div>
</div>
</body>
</html>
"#,
        receipt = escape_html(&view.receipt_number),
        style = STYLE,
        gym_name = gym_name,
        contact = contact,
        date = view.payment_date.format("%B %-d, %Y"),
        member_name = escape_html(&view.member_name),
        member_code = escape_html(&view.member_code),
        member_email = escape_html(&view.member_email),
        member_phone = escape_html(&view.member_phone),
        plan_row = plan_row,
        description = escape_html(&view.description),
        duration = duration,
        amount = escape_html(&amount),
        method = escape_html(&humanize(view.payment_method.as_str())),
        issued_by = escape_html(view.issued_by.as_deref().unwrap_or("N/A")),
    )
}

/// `credit_card` -> `Credit Card`
pub fn humanize(raw: &str) -> String {
    raw.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn format_money(amount: Decimal, symbol: &str) -> String {
    format!("{}{:.2}", symbol, amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payments::PaymentMethod;
    use chrono::NaiveDate;

    fn view() -> ReceiptView {
        ReceiptView {
            payment_id: 1,
            receipt_number: "R20240101100000".to_string(),
            payment_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            amount: Decimal::new(4999, 2),
            payment_method: PaymentMethod::CreditCard,
            description: "Membership fee - Monthly".to_string(),
            member_code: "GYM20240005".to_string(),
            member_name: "Grace Hopper".to_string(),
            member_email: "grace@example.com".to_string(),
            member_phone: "555-0100".to_string(),
            plan_name: Some("Monthly".to_string()),
            plan_duration_days: Some(30),
            issued_by: Some("Front Desk".to_string()),
        }
    }

    fn branding() -> BrandingConfig {
        BrandingConfig {
            gym_name: "Iron Temple".to_string(),
            address: Some("1 Main St".to_string()),
            phone: None,
            currency_symbol: "$".to_string(),
        }
    }

    #[test]
    fn test_renders_core_fields() {
        let html = render_receipt_html(&view(), &branding());

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("R20240101100000"));
        assert!(html.contains("January 1, 2024"));
        assert!(html.contains("Grace Hopper"));
        assert!(html.contains("GYM20240005"));
        assert!(html.contains("30 days"));
        assert!(html.contains("$49.99"));
        assert!(html.contains("Credit Card"));
        assert!(html.contains("Issued by: Front Desk"));
        assert!(html.contains("1 Main St"));
    }

    #[test]
    fn test_missing_duration_is_na() {
        let mut v = view();
        v.plan_duration_days = None;
        v.plan_name = None;
        let html = render_receipt_html(&v, &branding());
        assert!(html.contains("<td>N/A</td>"));
        assert!(!html.contains("<strong>Plan:</strong>"));
    }

    #[test]
    fn test_member_input_is_escaped() {
        let mut v = view();
        v.member_name = "<script>alert('x')</script>".to_string();
        v.description = "Fee & \"tax\"".to_string();
        let html = render_receipt_html(&v, &branding());

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
        assert!(html.contains("Fee &amp; &quot;tax&quot;"));
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("credit_card"), "Credit Card");
        assert_eq!(humanize("cash"), "Cash");
        assert_eq!(humanize("mobile_payment"), "Mobile Payment");
        assert_eq!(humanize("bank__transfer"), "Bank Transfer");
    }

    #[test]
    fn test_money_keeps_two_places() {
        assert_eq!(format_money(Decimal::new(50, 0), "$"), "$50.00");
        assert_eq!(format_money(Decimal::new(12995, 2), "€"), "€129.95");
    }
}
