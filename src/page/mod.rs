//! 页面适配层
//!
//! 把答题页面的 DOM 读写包装成引擎需要的 `QuestionReader` / `AnswerWriter`。

pub mod dom_reader;
pub mod dom_writer;
pub mod selectors;

pub use dom_reader::DomReader;
pub use dom_writer::DomWriter;
