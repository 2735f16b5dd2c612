pub mod winnt;
