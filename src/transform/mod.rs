//! Research output transformation.
//!
//! This module turns one query solution describing an R4D research output into
//! a [`Document`]: normalized title and slug, markdown body, heading outline,
//! metadata, and classified attachments.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use dfid_transition::config::MigrationConfig;
//! use dfid_transition::transform::{Document, FieldValue};
//!
//! let solution = HashMap::from([
//!     ("output".to_string(), FieldValue::uri("http://r4d.dfid.gov.uk/Output/5050/Default.aspx")),
//!     ("title".to_string(), FieldValue::literal("Mobile Phones")),
//!     ("date".to_string(), FieldValue::literal("2016-04-28T09:52:00")),
//!     ("abstract".to_string(), FieldValue::literal("&lt;p&gt;Hello&lt;/p&gt;")),
//! ]);
//!
//! let doc = Document::from_source(&solution, &MigrationConfig::default()).unwrap();
//! assert_eq!(doc.slug(), "mobile-phones");
//! assert_eq!(doc.body(), "## Abstract\n\nHello");
//! ```

mod attachment;
mod classifier;
mod document;
mod error;
mod filename;
mod headers;
pub mod hosts;
pub mod html;
mod links;
mod slug;
mod source;

pub use attachment::{Attachment, AttachmentJson, Classification};
pub use classifier::{classify, render_attachments};
pub use document::{
    BodyPart, ChangeNote, DOCUMENT_TYPE, Details, Document, FIRST_PUBLISHED_NOTE,
    FormatSpecificMetadata, Metadata, Preview, ReviewStatus,
};
pub use error::{AttachmentError, DocumentError, MAX_URL_LENGTH};
pub use filename::{content_type_for_filename, filename_from_url};
pub use headers::{Header, extract_headers};
pub use html::normalize;
pub use links::LinkRewriter;
pub use slug::{MAX_SLUG_LENGTH, slugify};
pub use source::{
    FieldSource, FieldValue, SparqlBinding, SparqlBindings, SparqlResults, SparqlTerm, XSD_BOOLEAN,
};
