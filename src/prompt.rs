/// Which prompt wording a generator expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PromptVariant {
    OpenAi,
    Replicate,
}

// Titles whose template prompt the OpenAI content filter rejects. Keys are
// lowercase; titles are compared after Unicode lowercasing.
const OPENAI_OVERRIDES: &[(&str, &str)] = &[(
    "man rubbing calves",
    "Create a vertical thumbnail for a fitness video about leg muscle recovery. \
     Show a professional fitness setting with exercise equipment and recovery tools. \
     Make it suitable for mobile viewing in portrait orientation with vibrant colors \
     and clear focal points.",
)];

pub(crate) fn build_prompt(title: &str, variant: PromptVariant) -> String {
    if variant == PromptVariant::OpenAi {
        if let Some(prompt) = find_override(OPENAI_OVERRIDES, title) {
            return prompt.to_owned();
        }
    }

    format!(
        "Create a vertical thumbnail for a TikTok-style video titled '{title}'. \
         The image should be eye-catching and modern, with vibrant colors and clear focal points. \
         Make it suitable for mobile viewing in portrait orientation. \
         Ensure the composition works well in a 9:16 aspect ratio."
    )
}

fn find_override<'a>(table: &[(&str, &'a str)], title: &str) -> Option<&'a str> {
    let lowered = title.to_lowercase();
    table
        .iter()
        .find(|(key, _)| *key == lowered)
        .map(|(_, prompt)| *prompt)
}
