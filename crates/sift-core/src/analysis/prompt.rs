//! Instruction prompt for reading dates off a product label.

/// Date format the model is asked to use.
pub const DATE_FORMAT: &str = "DD/MM/YYYY";

/// Build the label-analysis prompt.
///
/// `today` is embedded so the model can apply the single-date rule
/// (future date means expiration, past date means production).
pub fn label_prompt(today: &str) -> String {
    format!(
        r#"You are reading the packaging label in this image. Today is {today}.

Return ONLY a JSON object inside a ```json fenced code block with exactly these fields:
{{
  "production_date": "production / manufacturing date in {DATE_FORMAT}, or null",
  "expiration_date": "expiration / best-before date in {DATE_FORMAT}, or null",
  "production_id": "lot, batch or production code exactly as printed, or null",
  "additional_info": "any other relevant text near the dates, or null"
}}

Rules:
- Convert every date you report to {DATE_FORMAT}. If the day is missing, use 01.
- Labels such as "MFD", "PROD", "P" mark production dates; "EXP", "BB", "BBE", "USE BY", "E" mark expiration dates.
- If exactly one date is printed and it is not labeled: when it is after today treat it as the expiration_date, otherwise treat it as the production_date.
- Never invent values. Use null for anything not visible.
- Do not add any text outside the code block."#
    )
}
