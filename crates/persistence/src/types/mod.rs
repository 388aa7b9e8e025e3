//! Core types shared by the stores and the service layer.
//!
//! - [`PageRequest`], [`SortOrder`] - what a caller asks for
//! - [`Page`] - one slice of results plus the total count
//!
//! ```
//! use plates_persistence::types::{PageRequest, SortDirection, SortOrder};
//!
//! let request = PageRequest::new(2, 20).with_sort(SortOrder::parse("plateTitle,desc"));
//! assert_eq!(request.offset(), 40);
//! assert_eq!(request.sort[0].direction, SortDirection::Desc);
//! ```

mod pagination;

pub use pagination::{Page, PageRequest, SortDirection, SortOrder};
