//! Prompt sent to the extraction collaborator.

use chrono::NaiveDate;

use crate::booking::BookingData;

/// Instructions for the extraction model. Placeholders are filled by [`build_prompt`].
pub const EXTRACTION_PROMPT: &str = r#"You extract hotel booking details from a guest's request and update the existing data.

Today's date: {today}

User input: "{input}"
Existing data: {existing}

Reply with a single JSON object in exactly this shape:
{
  "location": "city or area (null if not mentioned)",
  "checkin": "YYYY-MM-DD (null if not stated explicitly)",
  "checkout": "YYYY-MM-DD (null if not stated explicitly)",
  "nights": "integer number of nights (null if not mentioned)",
  "guests": "integer number of guests (null if not mentioned)",
  "budget": "integer budget in whole currency units (null if not mentioned)",
  "preferences": ["list of preferences"]
}

RULES:
1. KEEP EXISTING DATA: never remove or change existing values unless the new input explicitly updates them.
2. NO AUTO-FILL: only fill a field when the new input states it explicitly. Unknown values are null, never guessed.
3. MERGE: combine the existing data with the new data; add new preferences to the existing ones instead of replacing them.

Correct:
- Existing: {"location": "Nusa Dua", "budget": 2000000}
- Input: "spa preferred"
- Output: {"location": "Nusa Dua", "budget": 2000000, "preferences": ["spa"]}

Wrong (existing data lost):
- Output: {"location": null, "preferences": ["spa"]}

Examples:
- "20-25 June 2025" -> checkin: "2025-06-20", checkout: "2025-06-25", nights: 5
- "check in 20 August for 3 nights" -> checkin: "2025-08-20", checkout: "2025-08-23", nights: 3
- "2 people" -> guests: 2
- "budget 2 million" -> budget: 2000000
- "max 5.5 million" -> budget: 5500000
- "budget Rp 3.000.000" -> budget: 3000000

Resolve dates without a year relative to today's date. Return only the JSON, no explanation."#;

/// Render the extraction prompt for one request.
pub fn build_prompt(input: &str, existing: &BookingData, today: NaiveDate) -> String {
    let existing_json = serde_json::to_string(existing).unwrap_or_else(|_| "{}".to_string());
    EXTRACTION_PROMPT
        .replace("{today}", &today.format("%Y-%m-%d").to_string())
        .replace("{existing}", &existing_json)
        .replace("{input}", &input.replace('"', "'"))
}
