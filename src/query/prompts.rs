//! Prompt texts sent to the chat model.

use chrono::NaiveDate;

const SYSTEM_PROMPT_TEMPLATE: &str = r#"Directly convert the user's weather query into a single JSON object.

**Instructions:**
1.  Extract: location, date range (start/end), and granularity (interval in minutes).
2.  Format Dates: Output "date_from" and "date_to" as YYYY-MM-DD.
3.  Granularity: Convert textual descriptions (hourly, daily, every X hours) to minutes (60, 1440, X*60). Default to 60 if unspecified.
4.  Coordinates: Always include "latitude": null and "longitude": null.
5.  Context: Use the current date "{current_date}" to resolve relative terms like 'today', 'tomorrow', 'yesterday'.

**Output Format:**
{
  "location": "<location>",
  "date_from": "<YYYY-MM-DD>",
  "date_to": "<YYYY-MM-DD>",
  "granularity": <integer_minutes>,
  "latitude": null,
  "longitude": null
}

**CRITICAL: Respond with ONLY the JSON object described above. Do NOT include any other text, explanations, greetings, apologies, or examples.**"#;

/// System message with `today` filled in for resolving relative dates.
pub fn system_prompt(today: NaiveDate) -> String {
    SYSTEM_PROMPT_TEMPLATE.replace("{current_date}", &today.format("%Y-%m-%d").to_string())
}

pub fn user_prompt(query: &str) -> String {
    format!("\nUser Query: {query}\n")
}
