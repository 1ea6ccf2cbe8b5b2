use crate::error::SplitError;
use crate::pipeline::config::SplitConfig;

/// Builds group keys from header lines.
///
/// The header is split on the delimiter and the configured fields are joined,
/// in configuration order, with the join separator. With the defaults,
/// `@INST:1:FC1:3:1101:1000:2000` yields `FC1.3`.
#[derive(Debug, Clone)]
pub struct KeyExtractor {
    delimiter: String,
    field_indices: Vec<usize>,
    join_separator: String,
    /// Number of fields a header needs for every index to be in range
    required_fields: usize,
}

impl KeyExtractor {
    pub fn new(config: &SplitConfig) -> Self {
        let required_fields = config
            .field_indices
            .iter()
            .max()
            .map_or(0, |&max_index| max_index + 1);

        KeyExtractor {
            delimiter: config.delimiter.clone(),
            field_indices: config.field_indices.clone(),
            join_separator: config.join_separator.clone(),
            required_fields,
        }
    }

    pub fn required_fields(&self) -> usize {
        self.required_fields
    }

    /// Extract the group key of `line`. `line_number` is only used for error reporting.
    pub fn extract(&self, line: &str, line_number: usize) -> Result<String, SplitError> {
        let fields: Vec<&str> = line.split(self.delimiter.as_str()).collect();

        if fields.len() < self.required_fields {
            return Err(SplitError::MalformedHeader {
                line_number,
                line: line.to_string(),
                delimiter: self.delimiter.clone(),
                required: self.required_fields,
                found: fields.len(),
            });
        }

        let selected: Vec<&str> = self.field_indices.iter().map(|&i| fields[i]).collect();
        Ok(selected.join(&self.join_separator))
    }
}

/// One-shot form of [`KeyExtractor::extract`].
pub fn extract_key(line: &str, config: &SplitConfig) -> Result<String, SplitError> {
    KeyExtractor::new(config).extract(line, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "@A00123:8:HF7VKDSXY:2:1101:1000:2000 1:N:0:ACGT";

    #[test]
    fn test_default_flowcell_lane() {
        let config = SplitConfig::default();
        assert_eq!(extract_key(HEADER, &config).unwrap(), "HF7VKDSXY.2");
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let extractor = KeyExtractor::new(&SplitConfig::default());
        let first = extractor.extract(HEADER, 1).unwrap();
        let second = extractor.extract(HEADER, 1).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_order_and_separator() {
        let config = SplitConfig {
            field_indices: vec![3, 0, 2],
            join_separator: "_".to_string(),
            ..Default::default()
        };
        assert_eq!(extract_key(HEADER, &config).unwrap(), "2_@A00123_HF7VKDSXY");
    }

    #[test]
    fn test_repeated_index() {
        let config = SplitConfig {
            field_indices: vec![1, 1],
            ..Default::default()
        };
        assert_eq!(extract_key(HEADER, &config).unwrap(), "8.8");
    }

    #[test]
    fn test_multichar_delimiter() {
        let config = SplitConfig {
            delimiter: "::".to_string(),
            field_indices: vec![1],
            ..Default::default()
        };
        assert_eq!(extract_key("@a::b::c", &config).unwrap(), "b");
    }

    #[test]
    fn test_exact_field_count_boundary() {
        let config = SplitConfig::default();
        let extractor = KeyExtractor::new(&config);
        assert_eq!(extractor.required_fields(), 4);

        assert_eq!(extractor.extract("@I:1:FC1:3", 1).unwrap(), "FC1.3");

        match extractor.extract("@I:1:FC1", 5) {
            Err(SplitError::MalformedHeader {
                line_number,
                line,
                required,
                found,
                ..
            }) => {
                assert_eq!(line_number, 5);
                assert_eq!(line, "@I:1:FC1");
                assert_eq!(required, 4);
                assert_eq!(found, 3);
            }
            other => panic!("expected malformed header, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_fields_are_kept() {
        let config = SplitConfig::default();
        assert_eq!(extract_key("@I:1::3", &config).unwrap(), ".3");
    }
}
