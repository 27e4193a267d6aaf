// src/mailer.rs

use std::fmt;

use chrono::Utc;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::models::{Design, Purchase, User};

#[derive(Debug)]
pub enum MailError {
    Address(String),
    Message(String),
    Transport(String),
}

impl fmt::Display for MailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MailError::Address(e) => write!(f, "invalid address: {e}"),
            MailError::Message(e) => write!(f, "message build error: {e}"),
            MailError::Transport(e) => write!(f, "mail transport error: {e}"),
        }
    }
}

/// SMTP dispatcher for proof-of-purchase receipts.
///
/// Delivery is best-effort: a purchase stays `paid` whether or not the
/// receipt goes out, so callers log a `MailError` instead of failing the
/// transaction.
#[derive(Clone)]
pub struct Mailer {
    smtp_host: String,
    smtp_port: u16,
    credentials: Credentials,
    from_email: String,
    from_name: String,
}

pub fn format_amount(amount: i64, currency: &str) -> String {
    format!("{}.{:02} {}", amount / 100, (amount % 100).abs(), currency)
}

/// Fixed-layout receipt document, attached to both outgoing mails.
pub fn render_receipt(purchase: &Purchase, buyer: &User, designer: &User, design: &Design) -> String {
    let purchase_date = purchase
        .created_at
        .unwrap_or_else(Utc::now)
        .format("%Y-%m-%d %H:%M UTC");
    let amount = format_amount(purchase.amount, &purchase.currency);

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>TeeSpark - Proof of Purchase</title>
</head>
<body style="font-family: Helvetica, Arial, sans-serif; color: #333;">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
        <h1 style="text-align: center;">TeeSpark - Proof of Purchase</h1>
        <p style="text-align: center;">
            Transaction ID: {payment_id}<br>
            Order ID: {order_id}<br>
            Purchase Date: {purchase_date}
        </p>
        <hr>
        <h3>Buyer Information</h3>
        <p>Name: {buyer_name}<br>Email: {buyer_email}</p>
        <h3>Designer Information</h3>
        <p>Name: {designer_name}<br>Email: {designer_email}</p>
        <hr>
        <h3>Design Details</h3>
        <p>Design Title: {design_title}</p>
        <p><strong>Amount Paid: {amount}</strong></p>
        <hr>
        <p style="text-align: center; font-size: 12px; font-style: italic;">
            Thank you for your purchase from TeeSpark!<br>
            This document serves as your official receipt and proof of license.
        </p>
    </div>
</body>
</html>
"#,
        payment_id = purchase.payment_id,
        order_id = purchase.order_id,
        purchase_date = purchase_date,
        buyer_name = buyer.username,
        buyer_email = buyer.email,
        designer_name = designer.username,
        designer_email = designer.email,
        design_title = design.title,
        amount = amount,
    )
}

impl Mailer {
    pub fn new(
        smtp_host: String,
        smtp_port: u16,
        smtp_username: String,
        smtp_password: String,
        from_email: String,
        from_name: String,
    ) -> Self {
        Self {
            smtp_host,
            smtp_port,
            credentials: Credentials::new(smtp_username, smtp_password),
            from_email,
            from_name,
        }
    }

    fn build_transport(&self) -> Result<SmtpTransport, MailError> {
        Ok(SmtpTransport::relay(&self.smtp_host)
            .map_err(|e| MailError::Transport(format!("smtp relay error: {e}")))?
            .port(self.smtp_port)
            .credentials(self.credentials.clone())
            .build())
    }

    fn from_header(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_email)
    }

    fn build_message(
        &self,
        to: &str,
        subject: &str,
        body: String,
        receipt_html: String,
        receipt_filename: &str,
    ) -> Result<Message, MailError> {
        let text_part = SinglePart::builder()
            .header(ContentType::TEXT_PLAIN)
            .body(body);
        let receipt_part = Attachment::new(receipt_filename.to_string())
            .body(receipt_html, ContentType::TEXT_HTML);

        Message::builder()
            .from(
                self.from_header()
                    .parse()
                    .map_err(|e| MailError::Address(format!("from address: {e}")))?,
            )
            .to(to
                .parse()
                .map_err(|e| MailError::Address(format!("to address {to}: {e}")))?)
            .subject(subject)
            .multipart(
                MultiPart::mixed()
                    .singlepart(text_part)
                    .singlepart(receipt_part),
            )
            .map_err(|e| MailError::Message(e.to_string()))
    }

    /// Emails the receipt to buyer and designer. Both sends are attempted
    /// even when the first one fails.
    pub async fn send_receipt(
        &self,
        purchase: &Purchase,
        buyer: &User,
        designer: &User,
        design: &Design,
    ) -> Result<(), MailError> {
        if std::env::var("MOCK_MAIL").unwrap_or_default() == "true" {
            log::info!(
                "mock mail: receipt for payment_id={} not sent",
                purchase.payment_id
            );
            return Ok(());
        }

        let receipt_html = render_receipt(purchase, buyer, designer, design);
        let receipt_filename = format!("Receipt-{}.html", purchase.payment_id);

        let buyer_message = self.build_message(
            &buyer.email,
            &format!("Your TeeSpark Purchase Receipt for \"{}\"", design.title),
            format!(
                "Hi {},\n\nThank you for your purchase! Attached is the receipt for \
                 your purchase of \"{}\".\n\nBest,\nThe TeeSpark Team\n",
                buyer.username, design.title
            ),
            receipt_html.clone(),
            &receipt_filename,
        )?;

        let designer_message = self.build_message(
            &designer.email,
            &format!("Your design \"{}\" has been sold!", design.title),
            format!(
                "Hi {},\n\nGreat news! Your design \"{}\" has been purchased. A proof \
                 of the transaction is attached.\n\nBest,\nThe TeeSpark Team\n",
                designer.username, design.title
            ),
            receipt_html,
            &receipt_filename,
        )?;

        let transport = self.build_transport()?;

        tokio::task::spawn_blocking(move || {
            let mut failures = Vec::new();
            for message in [buyer_message, designer_message] {
                if let Err(e) = transport.send(&message) {
                    failures.push(e.to_string());
                }
            }
            if failures.is_empty() {
                Ok(())
            } else {
                Err(MailError::Transport(failures.join("; ")))
            }
        })
        .await
        .map_err(|e| MailError::Transport(format!("mail task failed: {e}")))?
    }
}
