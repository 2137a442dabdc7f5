pub mod ols;
pub mod semsql;

pub use ols::{OlsDoc, OlsSource};
pub use semsql::{SemSqlRow, SemSqlSource};
