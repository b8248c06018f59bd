/// Lexicon-based sentiment scoring for journal notes.
///
/// Each word carries a valence; the summed valence is squashed into
/// [-1, 1] with the same `x / sqrt(x^2 + 15)` normalization VADER-family
/// scorers use, then rounded to two decimals. A simple preceding-negation
/// check ("not good") flips a word's contribution. Blank text scores 0.
const POSITIVE: &[(&str, f64)] = &[
    ("amazing", 2.8),
    ("awesome", 3.1),
    ("best", 3.2),
    ("better", 1.9),
    ("calm", 1.3),
    ("confident", 2.2),
    ("energized", 2.0),
    ("enjoyed", 2.3),
    ("excellent", 2.7),
    ("excited", 2.2),
    ("focused", 1.7),
    ("fun", 2.3),
    ("glad", 2.0),
    ("good", 1.9),
    ("grateful", 2.4),
    ("great", 3.1),
    ("happy", 2.7),
    ("love", 3.2),
    ("motivated", 2.1),
    ("peaceful", 1.9),
    ("productive", 2.2),
    ("progress", 1.6),
    ("proud", 2.4),
    ("relaxed", 1.8),
    ("rested", 1.5),
    ("strong", 1.6),
    ("win", 2.8),
    ("wonderful", 2.7),
];

const NEGATIVE: &[(&str, f64)] = &[
    ("angry", -2.3),
    ("anxious", -1.9),
    ("awful", -2.9),
    ("bad", -2.5),
    ("bored", -1.3),
    ("burnout", -2.4),
    ("depressed", -2.7),
    ("distracted", -1.5),
    ("exhausted", -2.1),
    ("fail", -2.5),
    ("failed", -2.5),
    ("frustrated", -2.1),
    ("hate", -2.7),
    ("lazy", -1.4),
    ("lonely", -2.1),
    ("lost", -1.3),
    ("overwhelmed", -2.0),
    ("sad", -2.1),
    ("sick", -1.7),
    ("stressed", -2.2),
    ("stuck", -1.5),
    ("terrible", -2.8),
    ("tired", -1.4),
    ("unproductive", -2.0),
    ("worried", -1.8),
    ("worst", -3.1),
];

const NEGATIONS: &[&str] = &["not", "no", "never", "isnt", "wasnt", "dont", "didnt", "cant"];

fn valence(word: &str) -> Option<f64> {
    POSITIVE
        .iter()
        .chain(NEGATIVE)
        .find(|(w, _)| *w == word)
        .map(|(_, v)| *v)
}

/// Scores free text into [-1.0, 1.0], rounded to two decimals.
pub fn score(text: &str) -> f64 {
    let words: Vec<String> = text
        .split_whitespace()
        .map(|w| {
            w.chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        })
        .collect();

    let mut total = 0.0;
    for (i, word) in words.iter().enumerate() {
        let Some(mut v) = valence(word) else { continue };
        if i > 0 && NEGATIONS.contains(&words[i - 1].as_str()) {
            v = -v;
        }
        total += v;
    }

    if total == 0.0 {
        return 0.0;
    }
    let compound = total / (total * total + 15.0).sqrt();
    (compound * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_neutral() {
        assert_eq!(score(""), 0.0);
        assert_eq!(score("meeting at noon"), 0.0);
    }

    #[test]
    fn positive_and_negative_lean_the_right_way() {
        assert!(score("had a great and productive day") > 0.0);
        assert!(score("felt tired and stressed, terrible focus") < 0.0);
    }

    #[test]
    fn negation_flips_contribution() {
        assert!(score("not good at all") < 0.0);
        assert!(score("not bad today") > 0.0);
    }

    #[test]
    fn score_stays_bounded() {
        let gushing = "great great great amazing wonderful best love happy ".repeat(20);
        let s = score(&gushing);
        assert!(s > 0.9 && s <= 1.0);
    }
}
