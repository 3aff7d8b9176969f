//! Document metadata shared across formats.
//!
//! OLE property-set streams and the RTF `\info` destination describe the
//! same document properties with different names and encodings. Both funnel
//! into [`Metadata`] so downstream consumers see one shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Standard document properties.
///
/// Every field is optional; absent properties stay `None` rather than
/// defaulting to empty strings, so serialized output only carries what the
/// source file actually declared.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub subject: Option<String>,
    pub author: Option<String>,
    pub keywords: Option<String>,
    /// Comments in OLE terms, `\doccomm` in RTF.
    pub description: Option<String>,
    /// Template the document was created from.
    pub template: Option<String>,
    pub last_modified_by: Option<String>,
    pub revision: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub page_count: Option<u32>,
    pub word_count: Option<u32>,
    pub character_count: Option<u32>,
    /// Name of the application that wrote the file.
    pub application: Option<String>,
    pub category: Option<String>,
    pub company: Option<String>,
    pub manager: Option<String>,
    /// Document security flags.
    pub security: Option<u32>,
    /// ANSI codepage the string properties were stored in.
    pub codepage: Option<u32>,
}

impl Metadata {
    /// Whether at least one property is populated.
    pub fn has_data(&self) -> bool {
        let texts = [
            &self.title,
            &self.subject,
            &self.author,
            &self.keywords,
            &self.description,
            &self.template,
            &self.last_modified_by,
            &self.revision,
            &self.application,
            &self.category,
            &self.company,
            &self.manager,
        ];
        let counts = [
            self.page_count,
            self.word_count,
            self.character_count,
            self.security,
            self.codepage,
        ];
        texts.iter().any(|field| field.is_some())
            || counts.iter().any(Option::is_some)
            || self.created.is_some()
            || self.modified.is_some()
    }
}

#[cfg(feature = "ole")]
impl From<crate::ole::OleMetadata> for Metadata {
    fn from(ole: crate::ole::OleMetadata) -> Self {
        Self {
            title: ole.title,
            subject: ole.subject,
            author: ole.author,
            keywords: ole.keywords,
            description: ole.comments,
            template: ole.template,
            last_modified_by: ole.last_saved_by,
            revision: ole.revision_number,
            created: ole.create_time,
            modified: ole.last_saved_time,
            page_count: ole.num_pages,
            word_count: ole.num_words,
            character_count: ole.num_chars,
            application: ole.creating_application,
            category: ole.category,
            company: ole.company,
            manager: ole.manager,
            security: ole.security,
            codepage: ole.codepage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metadata_reports_no_data() {
        assert!(!Metadata::default().has_data());
    }

    #[test]
    fn any_single_property_counts_as_data() {
        let with_title = Metadata {
            title: Some("Quarterly Report".to_string()),
            ..Default::default()
        };
        assert!(with_title.has_data());

        let with_pages = Metadata {
            page_count: Some(12),
            ..Default::default()
        };
        assert!(with_pages.has_data());

        let with_date = Metadata {
            modified: Some(Utc::now()),
            ..Default::default()
        };
        assert!(with_date.has_data());
    }

    #[test]
    #[cfg(feature = "ole")]
    fn ole_properties_map_onto_common_names() {
        let ole = crate::ole::OleMetadata {
            title: Some("Budget".to_string()),
            comments: Some("second draft".to_string()),
            last_saved_by: Some("editor".to_string()),
            codepage: Some(1252),
            ..Default::default()
        };

        let metadata: Metadata = ole.into();
        assert_eq!(metadata.title.as_deref(), Some("Budget"));
        assert_eq!(metadata.description.as_deref(), Some("second draft"));
        assert_eq!(metadata.last_modified_by.as_deref(), Some("editor"));
        assert_eq!(metadata.codepage, Some(1252));
    }
}
