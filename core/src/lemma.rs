//! Rule-based, part-of-speech aware lemmatizer for English listing text.
//!
//! Each token gets a single-word part-of-speech guess (defaulting to noun),
//! then per-POS irregular forms are looked up before WordNet-style suffix
//! detachment rules are applied.

use lazy_static::lazy_static;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartOfSpeech {
    Noun,
    Verb,
    Adjective,
    Adverb,
}

lazy_static! {
    static ref NOUN_EXCEPTIONS: HashMap<&'static str, &'static str> = [
        ("men", "man"), ("women", "woman"), ("children", "child"), ("feet", "foot"),
        ("teeth", "tooth"), ("geese", "goose"), ("mice", "mouse"), ("knives", "knife"),
        ("wives", "wife"), ("lives", "life"), ("leaves", "leaf"), ("shelves", "shelf"),
        ("halves", "half"), ("tomatoes", "tomato"), ("potatoes", "potato"), ("heroes", "hero"),
        ("series", "series"), ("species", "species"), ("news", "news"), ("buses", "bus"),
        ("movies", "movie"), ("cookies", "cookie"), ("dice", "die"), ("oases", "oasis"),
        ("canvas", "canvas"), ("atlas", "atlas"), ("christmas", "christmas"), ("alias", "alias"),
        ("bias", "bias"), ("texas", "texas"), ("pampas", "pampas"), ("vegas", "vegas"),
        ("canvases", "canvas"), ("atlases", "atlas"), ("gases", "gas"),
    ]
    .into_iter()
    .collect();

    static ref VERB_EXCEPTIONS: HashMap<&'static str, &'static str> = [
        ("went", "go"), ("gone", "go"), ("going", "go"), ("made", "make"), ("built", "build"),
        ("rebuilt", "rebuild"), ("sold", "sell"), ("bought", "buy"), ("brought", "bring"),
        ("thought", "think"), ("found", "find"), ("kept", "keep"), ("left", "leave"),
        ("felt", "feel"), ("slept", "sleep"), ("sat", "sit"), ("stood", "stand"), ("ran", "run"),
        ("came", "come"), ("became", "become"), ("got", "get"), ("gotten", "get"),
        ("gave", "give"), ("given", "give"), ("took", "take"), ("taken", "take"), ("saw", "see"),
        ("seen", "see"), ("knew", "know"), ("known", "know"), ("heard", "hear"), ("held", "hold"),
        ("paid", "pay"), ("said", "say"), ("told", "tell"), ("spent", "spend"), ("meant", "mean"),
        ("lit", "light"), ("fed", "feed"), ("led", "lead"), ("hid", "hide"), ("hidden", "hide"),
        ("drove", "drive"), ("driven", "drive"), ("wrote", "write"), ("written", "write"),
        ("ate", "eat"), ("eaten", "eat"), ("swam", "swim"), ("swum", "swim"), ("began", "begin"),
        ("begun", "begin"), ("woke", "wake"), ("woken", "wake"), ("chose", "choose"),
        ("chosen", "choose"), ("forgot", "forget"), ("forgotten", "forget"), ("used", "use"),
        ("using", "use"), ("lying", "lie"), ("dying", "die"), ("tying", "tie"), ("died", "die"),
        ("tied", "tie"), ("lied", "lie"), ("created", "create"), ("creating", "create"),
        ("travelling", "travel"), ("travelled", "travel"),
    ]
    .into_iter()
    .collect();

    static ref ADJECTIVE_EXCEPTIONS: HashMap<&'static str, &'static str> = [
        ("better", "good"), ("best", "good"), ("worse", "bad"), ("worst", "bad"),
        ("further", "far"), ("farther", "far"), ("furthest", "far"), ("farthest", "far"),
    ]
    .into_iter()
    .collect();

    static ref ADJECTIVES: HashSet<&'static str> = [
        "big", "large", "small", "cheap", "quiet", "nice", "close", "new", "old", "great", "warm",
        "cool", "bright", "clean", "wide", "fine", "safe", "cozy", "cosy", "easy", "happy",
        "pretty", "lovely", "busy", "early", "late", "high", "low", "long", "short", "near",
        "fast", "hot", "cold", "calm", "dark", "light", "sunny", "cute", "modern", "private",
        "central", "elegant", "rustic", "historic", "authentic", "typical", "traditional",
        "spacious", "panoramic", "romantic", "exclusive", "fantastic", "perfect", "independent",
        "entire", "whole", "full", "free", "ideal", "unique", "little", "sweet", "deluxe",
        "superior", "rich", "tiny", "fresh", "simple", "pure", "rare", "wild", "deep", "young",
    ]
    .into_iter()
    .collect();

    static ref ING_ADJECTIVES: HashSet<&'static str> = [
        "amazing", "stunning", "charming", "breathtaking", "outstanding", "interesting",
        "exciting", "inviting", "welcoming", "fascinating", "enchanting", "captivating",
    ]
    .into_iter()
    .collect();

    static ref ING_NOUNS: HashSet<&'static str> = [
        "building", "ceiling", "morning", "evening", "wedding", "clothing", "housing", "parking",
        "lodging", "dining", "sibling", "pudding", "awning", "railing", "flooring", "lighting",
        "heating", "shopping", "bedding", "seating", "nothing", "something", "anything",
        "everything", "ping", "sing",
    ]
    .into_iter()
    .collect();

    static ref ED_NON_VERBS: HashSet<&'static str> = [
        "hundred", "sacred", "naked", "wicked", "kindred", "rugged", "beloved", "ragged",
        "crooked", "hatred",
    ]
    .into_iter()
    .collect();
}

const ADJECTIVE_SUFFIXES: &[&str] = &["ful", "ous", "ive", "able", "ible", "ical", "less", "ish"];

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

fn plausible_stem(stem: &str) -> bool {
    stem.chars().count() >= 3 && stem.chars().any(is_vowel)
}

/// Best single-word guess of the part of speech; ambiguous words are nouns.
pub fn guess_pos(word: &str) -> PartOfSpeech {
    if VERB_EXCEPTIONS.contains_key(word) {
        return PartOfSpeech::Verb;
    }
    if ADJECTIVE_EXCEPTIONS.contains_key(word) || ADJECTIVES.contains(word) || ING_ADJECTIVES.contains(word) {
        return PartOfSpeech::Adjective;
    }
    if NOUN_EXCEPTIONS.contains_key(word) || ING_NOUNS.contains(word) || ED_NON_VERBS.contains(word) {
        return PartOfSpeech::Noun;
    }
    if word.len() > 4 && word.ends_with("ly") {
        return PartOfSpeech::Adverb;
    }
    if comparative_base(word).is_some() {
        return PartOfSpeech::Adjective;
    }
    if ADJECTIVE_SUFFIXES.iter().any(|s| word.len() > s.len() + 2 && word.ends_with(s)) {
        return PartOfSpeech::Adjective;
    }
    if let Some(stem) = word.strip_suffix("ing") {
        if plausible_stem(stem) {
            return PartOfSpeech::Verb;
        }
    }
    if let Some(stem) = word.strip_suffix("ed") {
        if !word.ends_with("eed") && plausible_stem(stem) {
            return PartOfSpeech::Verb;
        }
    }
    PartOfSpeech::Noun
}

/// Lemmatize a lowercase token using its guessed part of speech.
pub fn lemmatize(word: &str) -> String {
    lemmatize_as(word, guess_pos(word))
}

pub fn lemmatize_as(word: &str, pos: PartOfSpeech) -> String {
    match pos {
        PartOfSpeech::Noun => noun_lemma(word),
        PartOfSpeech::Verb => verb_lemma(word),
        PartOfSpeech::Adjective => adjective_lemma(word),
        PartOfSpeech::Adverb => word.to_string(),
    }
}

fn noun_lemma(word: &str) -> String {
    if let Some(lemma) = NOUN_EXCEPTIONS.get(word) {
        return lemma.to_string();
    }
    if word.chars().count() <= 3 || !word.ends_with('s') || ["ss", "us", "is"].iter().any(|s| word.ends_with(s)) {
        return word.to_string();
    }
    if word.len() > 4 {
        if let Some(stem) = word.strip_suffix("ies") {
            return format!("{stem}y");
        }
    }
    for suffix in ["sses", "xes", "zzes", "ches", "shes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    word[..word.len() - 1].to_string()
}

fn verb_lemma(word: &str) -> String {
    if let Some(lemma) = VERB_EXCEPTIONS.get(word) {
        return lemma.to_string();
    }
    if let Some(stem) = word.strip_suffix("ied") {
        if stem.chars().count() >= 2 {
            return format!("{stem}y");
        }
    }
    if let Some(stem) = word.strip_suffix("ed").or_else(|| word.strip_suffix("ing")) {
        if plausible_stem(stem) {
            return restore_stem(stem);
        }
    }
    if let Some(stem) = word.strip_suffix("ies") {
        return format!("{stem}y");
    }
    if word.len() > 3 && word.ends_with('s') && !word.ends_with("ss") {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

fn adjective_lemma(word: &str) -> String {
    if let Some(lemma) = ADJECTIVE_EXCEPTIONS.get(word) {
        return lemma.to_string();
    }
    comparative_base(word).unwrap_or_else(|| word.to_string())
}

/// Base form of a comparative/superlative of a known adjective.
fn comparative_base(word: &str) -> Option<String> {
    let stem = word.strip_suffix("est").or_else(|| word.strip_suffix("er"))?;
    if stem.chars().count() < 2 {
        return None;
    }
    let mut candidates = vec![stem.to_string(), format!("{stem}e"), undouble(stem)];
    if let Some(s) = stem.strip_suffix('i') {
        candidates.push(format!("{s}y"));
    }
    candidates.into_iter().find(|c| ADJECTIVES.contains(c.as_str()))
}

fn undouble(stem: &str) -> String {
    let chars: Vec<char> = stem.chars().collect();
    let n = chars.len();
    if n >= 2 && chars[n - 1] == chars[n - 2] && !is_vowel(chars[n - 1]) {
        chars[..n - 1].iter().collect()
    } else {
        stem.to_string()
    }
}

/// Rebuild a verb root after stripping -ed/-ing: undo consonant doubling
/// (swimm -> swim) or restore a silent e (mak -> make, locat -> locate).
fn restore_stem(stem: &str) -> String {
    let chars: Vec<char> = stem.chars().collect();
    let n = chars.len();
    let last = chars[n - 1];
    if n >= 2 && last == chars[n - 2] && !is_vowel(last) && !matches!(last, 'l' | 's' | 'f' | 'z') {
        return chars[..n - 1].iter().collect();
    }
    if needs_silent_e(&chars) {
        format!("{stem}e")
    } else {
        stem.to_string()
    }
}

fn needs_silent_e(chars: &[char]) -> bool {
    let n = chars.len();
    if n < 2 {
        return false;
    }
    let last = chars[n - 1];
    let prev = chars[n - 2];
    // short consonant-vowel-consonant roots that would have doubled otherwise
    if n == 3 && !is_vowel(chars[0]) && is_vowel(prev) && !is_vowel(last) && !matches!(last, 'w' | 'x' | 'y') {
        return true;
    }
    if matches!(last, 'v' | 'c') {
        return true;
    }
    if matches!(prev, 'i' | 'y') && last == 'z' {
        return true;
    }
    if last == 'l' && matches!(prev, 'b' | 'p' | 't' | 'd' | 'g' | 'k') {
        return true;
    }
    let single_vowel = is_vowel(prev) && n >= 3 && !is_vowel(chars[n - 3]);
    match last {
        'r' => single_vowel && prev != 'e',
        's' | 'z' => single_vowel,
        't' => prev == 'a' && n >= 3 && (!is_vowel(chars[n - 3]) || chars[n - 3] == 'u'),
        _ => false,
    }
}
