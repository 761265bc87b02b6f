//! Fixed extraction prompts.

use crate::types::DocumentKind;

pub const RECEIPT_PROMPT: &str = "You are reading a photo of a business expense receipt. \
Extract the following fields and reply with a single JSON object and nothing else:\n\
- vendor: merchant name (string)\n\
- amount: total amount paid including tax (number)\n\
- currency: ISO 4217 currency code (string)\n\
- date: transaction date as YYYY-MM-DD (string)\n\
- location: city or address of the merchant (string)\n\
- expenseType: one of \"meals\", \"lodging\", \"transport\", \"fuel\", \"parking\", \"other\"\n\
- description: short description of what was purchased (string)\n\
- confidence: how confident you are in the extraction, 0.0 to 1.0 (number)\n\
Omit any field you cannot read. Always include confidence.";

pub const ODOMETER_PROMPT: &str = "You are reading a photo of a vehicle dashboard odometer. \
Reply with a single JSON object and nothing else:\n\
- reading: the total distance shown on the odometer (number, no units)\n\
- date: the date shown on the dashboard as YYYY-MM-DD, if visible (string)\n\
- confidence: how confident you are in the reading, 0.0 to 1.0 (number)\n\
Ignore the trip meter. If no odometer is visible, omit reading.";

pub fn prompt_for(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Receipt => RECEIPT_PROMPT,
        DocumentKind::Odometer => ODOMETER_PROMPT,
    }
}
