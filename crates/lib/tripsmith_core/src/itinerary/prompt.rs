//! Prompt rendering for itinerary generation.

use std::fmt::Write;

use super::dates::format_short;
use crate::models::trip::TripRequest;

/// JSON shape the model is asked to reply with.
const RESPONSE_SHAPE: &str = r#"[
  {
    "date": "YYYY-MM-DD",
    "title": "Day 1: Title",
    "description": "Brief description of the day",
    "activities": [
      {
        "time": "09:00 AM",
        "title": "Activity name",
        "type": "breakfast/sightseeing/etc",
        "location": "Location name",
        "description": "Brief description"
      }
    ]
  }
]"#;

/// Render a trip request into the instruction sent to the model.
///
/// Pure: identical requests yield identical prompts.
pub fn build(request: &TripRequest) -> String {
    let mut prompt = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(
        prompt,
        "Generate a detailed day-by-day travel itinerary for a trip to {}.",
        request.destination
    );
    prompt.push('\n');
    prompt.push_str("Trip details:\n");
    let _ = writeln!(
        prompt,
        "- Duration: {} {} ({} to {})",
        request.duration,
        if request.duration == 1 { "day" } else { "days" },
        format_short(request.start_date),
        format_short(request.end_date),
    );
    let _ = writeln!(prompt, "- Number of travelers: {}", request.travelers);
    let _ = writeln!(prompt, "- Budget: {}", request.budget);
    let _ = writeln!(prompt, "- Interests: {}", request.interests.join(", "));
    let _ = writeln!(prompt, "- Pace: {}", request.pace);
    if let Some(accommodation) = &request.accommodation {
        let _ = writeln!(prompt, "- Preferred accommodation: {accommodation}");
    }
    if let Some(notes) = &request.notes {
        let _ = writeln!(prompt, "- Additional notes: {notes}");
    }

    prompt.push('\n');
    prompt.push_str("Please provide a detailed itinerary with:\n");
    let _ = writeln!(prompt, "1. Exactly {} days, each with a title", request.duration);
    prompt.push_str("2. 4-6 activities per day, including meals, attractions, and experiences\n");
    prompt.push_str("3. For each activity, include: time, title, type, location, and a brief description\n");
    prompt.push_str("4. Suggest local restaurants and attractions that match the interests\n");
    prompt.push('\n');
    prompt.push_str("Format the response as a JSON array with this structure:\n");
    prompt.push_str(RESPONSE_SHAPE);
    prompt.push_str("\n\n");
    prompt.push_str(
        "Focus on providing a realistic, well-paced itinerary that includes both \
         popular attractions and local experiences.",
    );
    prompt
}
