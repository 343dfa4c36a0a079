use serde::{Deserialize, Deserializer};

pub fn deserialize_u64_opt_lax<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wrapper {
        Str(String),
        Num(u64),
        None,
    }

    match Option::<Wrapper>::deserialize(deserializer)? {
        Some(Wrapper::Num(n)) => Ok(Some(n)),
        Some(Wrapper::Str(s)) => s
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        Some(Wrapper::None) | None => Ok(None),
    }
}

/// Accepts a string or a number and keeps it as text. The study UI sends
/// numeric task ids while other hosts send strings.
pub fn deserialize_string_opt_lax<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wrapper {
        Str(String),
        Int(i64),
        Float(f64),
        None,
    }

    match Option::<Wrapper>::deserialize(deserializer)? {
        Some(Wrapper::Str(s)) => Ok(Some(s)),
        Some(Wrapper::Int(n)) => Ok(Some(n.to_string())),
        Some(Wrapper::Float(f)) => Ok(Some(f.to_string())),
        Some(Wrapper::None) | None => Ok(None),
    }
}
