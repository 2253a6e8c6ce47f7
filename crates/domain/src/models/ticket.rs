//! Ticket identifiers and scannable ticket codes.

use base64::{engine::general_purpose::STANDARD, Engine};
use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};
use serde::{Deserialize, Serialize};
use shared::crypto::{random_code, UPPER_ALPHANUMERIC};
use thiserror::Error;

/// Length of the random ticket suffix.
pub const TICKET_SUFFIX_LEN: usize = 6;

/// Minimum rendered size of the QR image in pixels.
const QR_MIN_DIMENSION: u32 = 240;

lazy_static::lazy_static! {
    static ref TICKET_ID_REGEX: regex::Regex =
        regex::Regex::new(r"^EVT\d{4,}-REG\d{6,}-[A-Z0-9]{6}$").unwrap();
}

/// Errors produced while rendering a ticket code.
#[derive(Debug, Error)]
pub enum TicketCodeError {
    #[error("Invalid ticket id format: {0}")]
    InvalidFormat(String),

    #[error("QR encoding failed: {0}")]
    Encoding(String),
}

/// A minted ticket identifier, e.g. `EVT0007-REG000042-K3Q9ZP`.
///
/// The event and registration segments are sequential; the random suffix keeps
/// identifiers from being enumerable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(String);

impl TicketId {
    /// Mints a new ticket identifier for the given event and registration.
    pub fn issue(event_id: i64, registration_id: i64) -> Self {
        let suffix = random_code(TICKET_SUFFIX_LEN, UPPER_ALPHANUMERIC);
        Self(format!(
            "EVT{:04}-REG{:06}-{}",
            event_id, registration_id, suffix
        ))
    }

    /// Parses and validates a presented ticket identifier.
    pub fn parse(raw: &str) -> Result<Self, TicketCodeError> {
        let trimmed = raw.trim();
        if TICKET_ID_REGEX.is_match(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(TicketCodeError::InvalidFormat(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for TicketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Renders a ticket identifier as a QR code (error correction level L).
///
/// Returns an inline `data:` URI holding the base64-encoded SVG image, ready to
/// embed in HTML or email bodies.
pub fn encode_payload(ticket_id: &TicketId) -> Result<String, TicketCodeError> {
    let code = QrCode::with_error_correction_level(ticket_id.as_str(), EcLevel::L)
        .map_err(|e| TicketCodeError::Encoding(e.to_string()))?;

    let image = code
        .render::<svg::Color>()
        .min_dimensions(QR_MIN_DIMENSION, QR_MIN_DIMENSION)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .build();

    Ok(format!(
        "data:image/svg+xml;base64,{}",
        STANDARD.encode(image.as_bytes())
    ))
}

/// A ticket identifier together with its rendered code.
#[derive(Debug, Clone)]
pub struct IssuedTicket {
    pub ticket_id: TicketId,
    pub qr_code: String,
}

/// Signature of the minting step stores call inside their admission unit of work.
pub type TicketMint = fn(i64, i64) -> Result<IssuedTicket, TicketCodeError>;

/// Mints a ticket identifier and renders its code.
pub fn mint_ticket(event_id: i64, registration_id: i64) -> Result<IssuedTicket, TicketCodeError> {
    let ticket_id = TicketId::issue(event_id, registration_id);
    let qr_code = encode_payload(&ticket_id)?;
    Ok(IssuedTicket { ticket_id, qr_code })
}
