mod credit;
mod metadata;
mod page;

pub use self::credit::{Credit, Role};
pub use self::metadata::Metadata;
pub use self::page::PageInfo;

fn sanitize(s: impl AsRef<str>) -> String {
    s.as_ref().trim().to_lowercase().replace('/', "").replace('-', "").replace('_', "").replace(' ', "")
}
