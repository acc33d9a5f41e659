//! Prompt templates for song extraction.

/// Longest description excerpt sent to a model, in characters.
const MAX_DESCRIPTION_CHARS: usize = 500;

/// Build the extraction prompt for one raw label.
pub fn extraction_prompt(
    raw_label: &str,
    description: Option<&str>,
    channel: Option<&str>,
) -> String {
    let description_str = match description {
        Some(d) => {
            let excerpt: String = d.chars().take(MAX_DESCRIPTION_CHARS).collect();
            if excerpt.len() < d.len() {
                format!("{}...", excerpt)
            } else {
                excerpt
            }
        }
        None => "None".to_string(),
    };

    format!(
        r#"Identify the song named by this playlist entry.

## Entry
- Title: "{}"
- Channel: "{}"
- Description: {}

## Rules
- The title is the song name only, not the album or movie name
- Drop descriptors such as "Official Video", "Lyrics", "4K", "HD", "Full Song", "Video Songs"
- For titles with ":" or "||", the part before is usually the song name
- For titles with "by" or "from", the song name comes before those words
- The artist is the singer or band, not the music director, the label channel or the actors
- Keep the song name exactly as written when it is already clean
- Use an empty string for the artist and null for the album when unknown

## Examples
- "UNPLUGGED Full Audio Song – Jeena Jeena by Sachin - Jigar" -> {{"title": "Jeena Jeena", "artist": "Atif Aslam", "album": "Badlapur"}}
- "Baarish Ki Jaaye | B Praak Ft Nawazuddin Siddiqui & Sunanda Sharma" -> {{"title": "Baarish Ki Jaaye", "artist": "B Praak", "album": null}}
- "The PropheC - To The Stars | Official Video" -> {{"title": "To The Stars", "artist": "The PropheC", "album": null}}

## Response Format
Respond with JSON:
```json
{{
    "title": "Song name",
    "artist": "Singer or band",
    "album": "Album or movie name, or null"
}}
```"#,
        raw_label,
        channel.unwrap_or("Unknown"),
        description_str,
    )
}

/// Get the system prompt for song extraction.
pub fn system_prompt() -> &'static str {
    r#"You are a music catalog expert helping match playlist entries across streaming services.

Your role is to read noisy video titles and name the song, its performing artist and its album.

Guidelines:
- Be precise; a wrong artist is worse than an empty one
- Recognise film soundtracks and regional music, not only Western releases
- Never invent a song that the title does not name
- Always respond with valid JSON when requested"#
}
