/// Prefix for artifact file names derived from a job.
pub const NAME_PREFIX: &str = "Diffusion";
/// How many characters of the prompt survive into the name.
pub const PROMPT_CHARS: usize = 20;

const IMAGE_EXT: &str = ".png";

/// Human-readable base name for a job's artifact:
/// `Diffusion_{sequence:03}_{sanitized prompt prefix}` (no extension).
pub fn artifact_basename(prompt: &str, sequence_id: u64) -> String {
    let cleaned = sanitize_prompt(prompt);
    format!("{NAME_PREFIX}_{sequence_id:03}_{cleaned}")
}

/// Full artifact file name, made unique against `is_taken` by appending
/// a numeric counter before the extension until a free name is found.
pub fn artifact_name<F>(prompt: &str, sequence_id: u64, is_taken: F) -> String
where
    F: Fn(&str) -> bool,
{
    let base = artifact_basename(prompt, sequence_id);
    let mut candidate = format!("{base}{IMAGE_EXT}");
    let mut counter = 1u32;
    while is_taken(&candidate) {
        candidate = format!("{base}_{counter}{IMAGE_EXT}");
        counter += 1;
    }
    candidate
}

/// Take the leading prompt characters and strip everything that is not
/// safe in a file name: spaces become underscores, path-unsafe and
/// non-word characters are dropped.
fn sanitize_prompt(prompt: &str) -> String {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return "untitled".to_string();
    }
    let cleaned: String = prompt
        .chars()
        .take(PROMPT_CHARS)
        .map(|c| if c == ' ' { '_' } else { c })
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        "untitled".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basename_carries_prefix_sequence_and_prompt() {
        assert_eq!(
            artifact_basename("wood planks", 7),
            "Diffusion_007_wood_planks"
        );
    }

    #[test]
    fn prompt_is_truncated_before_cleaning() {
        let name = artifact_basename("a very long prompt about mossy cobblestones", 1);
        // 20 chars of "a very long prompt a" -> underscored.
        assert_eq!(name, "Diffusion_001_a_very_long_prompt_a");
    }

    #[test]
    fn unsafe_characters_are_stripped() {
        assert_eq!(
            artifact_basename("rust:/\\<>\"|?*metal", 2),
            "Diffusion_002_rustmetal"
        );
    }

    #[test]
    fn empty_prompt_falls_back_to_untitled() {
        assert_eq!(artifact_basename("", 3), "Diffusion_003_untitled");
        assert_eq!(artifact_basename("???", 4), "Diffusion_004_untitled");
    }

    #[test]
    fn collision_counter_increments_until_free() {
        let taken = [
            "Diffusion_005_brick.png".to_string(),
            "Diffusion_005_brick_1.png".to_string(),
        ];
        let name = artifact_name("brick", 5, |candidate| {
            taken.iter().any(|t| t == candidate)
        });
        assert_eq!(name, "Diffusion_005_brick_2.png");
    }

    #[test]
    fn free_name_gets_no_counter() {
        let name = artifact_name("brick", 6, |_| false);
        assert_eq!(name, "Diffusion_006_brick.png");
    }
}
