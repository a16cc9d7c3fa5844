use crate::belief::Belief;
use crate::model::character::Character;
use crate::model::id::CharacterId;
use crate::model::knowledge::KnowledgeBase;

/// Most probable character not in `attempted`, with its current probability.
/// Earlier characters win ties; `None` once every character has been tried.
pub fn pick_guess<'a>(
    knowledge: &'a KnowledgeBase,
    belief: &Belief,
    attempted: &[CharacterId],
) -> Option<(&'a Character, f64)> {
    knowledge
        .characters
        .iter()
        .enumerate()
        .filter(|(_, character)| !attempted.contains(&character.id))
        .map(|(index, character)| (character, belief.prob_at(index)))
        .fold(None::<(&'a Character, f64)>, |best, candidate| match best {
            Some((_, best_prob)) if best_prob >= candidate.1 => best,
            _ => Some(candidate),
        })
}
