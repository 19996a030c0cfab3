/// Identity shared by every layer the map holds
#[derive(Debug, Clone, PartialEq)]
pub struct LayerProperties {
    pub id: String,
    pub name: String,
}

impl LayerProperties {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_properties() {
        let props = LayerProperties::new("station-0", "A");
        assert_eq!(props.id, "station-0");
        assert_eq!(props.name, "A");
    }
}
