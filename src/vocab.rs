//! Word-level vocabularies mapping surface tokens to embedding rows.
//!
//! Tokens are split on whitespace; there is no subword handling. The
//! reserved tokens keep the spelling of the bundled tables (`<pad`, `<sos`,
//! `<eos`, `<unk`).

use std::collections::HashMap;

use crate::error::{ModelError, Result};

pub const PAD: &str = "<pad";
pub const SOS: &str = "<sos";
pub const EOS: &str = "<eos";
pub const UNK: &str = "<unk";

/// Bidirectional token/index mapping with dense indices `0..len`.
#[derive(Debug, Clone, PartialEq)]
pub struct Vocabulary {
    stoi: HashMap<String, usize>,
    itos: Vec<String>,
}

impl Vocabulary {
    /// Assign indices in iteration order. Duplicate tokens are rejected.
    pub fn from_tokens<I, S>(tokens: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut stoi = HashMap::new();
        let mut itos = Vec::new();
        for tok in tokens {
            let tok = tok.into();
            if stoi.insert(tok.clone(), itos.len()).is_some() {
                return Err(ModelError::InvalidConfig(format!(
                    "duplicate token {tok:?} in vocabulary"
                )));
            }
            itos.push(tok);
        }
        Ok(Self { stoi, itos })
    }

    /// Build from explicit `(token, index)` pairs. Indices must cover
    /// `0..n` exactly once.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, usize)>,
        S: Into<String>,
    {
        let pairs: Vec<(String, usize)> = pairs.into_iter().map(|(t, i)| (t.into(), i)).collect();
        let mut slots: Vec<Option<String>> = vec![None; pairs.len()];
        for (tok, idx) in pairs {
            if idx >= slots.len() {
                return Err(ModelError::InvalidConfig(format!(
                    "index {idx} of token {tok:?} outside 0..{}",
                    slots.len()
                )));
            }
            if slots[idx].is_some() {
                return Err(ModelError::InvalidConfig(format!(
                    "index {idx} assigned twice (second token {tok:?})"
                )));
            }
            slots[idx] = Some(tok);
        }
        let tokens = slots
            .into_iter()
            .enumerate()
            .map(|(i, s)| {
                s.ok_or_else(|| ModelError::InvalidConfig(format!("no token for index {i}")))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_tokens(tokens)
    }

    /// Parse a JSON object of `token -> index` entries.
    pub fn from_json(json: &str) -> Result<Self> {
        let map: HashMap<String, usize> = serde_json::from_str(json)?;
        Self::from_pairs(map)
    }

    /// Built-in English toy table (130 entries).
    pub fn english() -> Self {
        Self::from_static(ENGLISH)
    }

    /// Built-in French toy table (151 entries).
    pub fn french() -> Self {
        Self::from_static(FRENCH)
    }

    fn from_static(tokens: &[&str]) -> Self {
        let itos: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
        let stoi = itos.iter().enumerate().map(|(i, t)| (t.clone(), i)).collect();
        Self { stoi, itos }
    }

    pub fn len(&self) -> usize {
        self.itos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.itos.is_empty()
    }

    pub fn index(&self, token: &str) -> Option<usize> {
        self.stoi.get(token).copied()
    }

    pub fn token(&self, id: usize) -> Option<&str> {
        self.itos.get(id).map(String::as_str)
    }

    pub fn pad_id(&self) -> Option<usize> {
        self.index(PAD)
    }

    pub fn sos_id(&self) -> Option<usize> {
        self.index(SOS)
    }

    pub fn eos_id(&self) -> Option<usize> {
        self.index(EOS)
    }

    /// Whitespace-split `sentence` and look up every word. Unknown words are
    /// an error.
    pub fn encode(&self, sentence: &str) -> Result<Vec<usize>> {
        sentence
            .split_whitespace()
            .map(|w| self.index(w).ok_or_else(|| ModelError::UnknownToken(w.to_string())))
            .collect()
    }

    /// Like [`Vocabulary::encode`], but maps unknown words to `<unk` when the
    /// vocabulary defines it.
    pub fn encode_lossy(&self, sentence: &str) -> Result<Vec<usize>> {
        let unk = self.index(UNK);
        sentence
            .split_whitespace()
            .map(|w| {
                self.index(w)
                    .or(unk)
                    .ok_or_else(|| ModelError::UnknownToken(w.to_string()))
            })
            .collect()
    }

    /// Join the surface forms of `ids` with single spaces, dropping pad.
    pub fn decode(&self, ids: &[usize]) -> Result<String> {
        let pad = self.pad_id();
        let mut words = Vec::with_capacity(ids.len());
        for &id in ids {
            if Some(id) == pad {
                continue;
            }
            words.push(self.token(id).ok_or(ModelError::UnknownId(id))?);
        }
        Ok(words.join(" "))
    }
}

const ENGLISH: &[&str] = &[
    "<pad", "<sos", "<eos", "<unk", "I", "you", "he", "she", "it", "we", "they", "my", "your",
    "his", "her", "our", "their", "am", "is", "are", "was", "were", "be", "been", "have", "has",
    "had", "do", "does", "did", "can", "could", "will", "would", "should", "must", "go", "goes",
    "went", "eat", "eats", "ate", "drink", "drinks", "drank", "see", "sees", "saw", "read",
    "reads", "like", "likes", "liked", "love", "loves", "loved", "hate", "hates", "hated", "want",
    "wants", "wanted", "need", "needs", "make", "makes", "made", "take", "takes", "took", "book",
    "books", "car", "cars", "house", "houses", "dog", "dogs", "cat", "cats", "man", "men",
    "woman", "women", "child", "children", "friend", "friends", "food", "water", "day", "days",
    "time", "school", "work", "a", "an", "the", "and", "but", "or", "in", "on", "at", "to",
    "from", "with", "without", "for", "of", "very", "really", "not", "now", "today", "yesterday",
    "tomorrow", "here", "there", "good", "bad", "big", "small", "new", "old", "happy", "sad", ".",
    "?", "!",
];

const FRENCH: &[&str] = &[
    "<pad", "<sos", "<eos", "<unk", "je", "tu", "il", "elle", "on", "nous", "vous", "ils",
    "elles", "mon", "ma", "mes", "ton", "ta", "tes", "son", "sa", "ses", "notre", "nos", "votre",
    "vos", "leur", "leurs", "suis", "es", "est", "sommes", "êtes", "sont", "étais", "était",
    "être", "ai", "as", "a", "avons", "avez", "ont", "avais", "avait", "fais", "fait", "faisons",
    "faites", "font", "vais", "vas", "va", "allons", "allez", "vont", "mange", "manges",
    "mangeons", "mangez", "mangent", "bois", "boit", "buvons", "buvez", "boivent", "vois", "voit",
    "voyons", "voyez", "voient", "aime", "aimes", "aimons", "aimez", "aiment", "veux", "veut",
    "voulons", "voulez", "veulent", "livre", "livres", "voiture", "voitures", "maison", "maisons",
    "chien", "chiens", "chat", "chats", "homme", "hommes", "femme", "femmes", "enfant", "enfants",
    "ami", "amie", "amis", "amies", "nourriture", "eau", "jour", "jours", "temps", "école",
    "travail", "un", "une", "le", "la", "les", "et", "mais", "ou", "dans", "sur", "à", "de",
    "avec", "sans", "pour", "très", "vraiment", "ne", "pas", "maintenant", "aujourd'hui", "hier",
    "demain", "ici", "là", "bon", "bonne", "mauvais", "mauvaise", "grand", "grande", "petit",
    "petite", "nouveau", "nouvelle", "vieux", "vieille", "heureux", "heureuse", "triste", ".",
    "?", "!",
];
