use anyhow::{Result, bail};

/// Read every variable in `names`, failing on the first missing or empty one.
pub fn require_env<const N: usize>(names: [&str; N]) -> Result<[String; N]> {
    let mut values: [String; N] = std::array::from_fn(|_| String::new());
    for (slot, name) in values.iter_mut().zip(names) {
        match std::env::var(name) {
            Ok(value) if !value.is_empty() => *slot = value,
            _ => bail!("Missing required environment variable: {name}"),
        }
    }
    Ok(values)
}

/// Non-empty value of `name`, if set.
pub fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
