use serde_json::Value;

/// Deep-merge `overrides` on top of `base`, returning a new value.
///
/// Mappings present on both sides are merged key by key; every other value
/// (sequences included) in `overrides` replaces the base value wholesale. A key
/// present in `overrides` always wins, even when its value is `null` or an empty
/// container. A top-level `null` override is treated as absent.
pub fn merge(base: &Value, overrides: &Value) -> Value {
    match (base, overrides) {
        (_, Value::Null) => base.clone(),
        (Value::Object(base_map), Value::Object(override_map)) => {
            let mut output = base_map.clone();
            for (key, value) in override_map {
                let merged = match (base_map.get(key), value) {
                    (Some(existing @ Value::Object(_)), Value::Object(_)) => merge(existing, value),
                    _ => value.clone(),
                };
                output.insert(key.clone(), merged);
            }
            Value::Object(output)
        }
        _ => overrides.clone(),
    }
}

/// Fold layers left to right; later layers win key for key.
pub fn merge_all<'a, I>(layers: I) -> Value
where
    I: IntoIterator<Item = &'a Value>,
{
    layers
        .into_iter()
        .fold(Value::Null, |acc, layer| match acc {
            Value::Null => layer.clone(),
            acc => merge(&acc, layer),
        })
}
