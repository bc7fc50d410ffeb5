//! Test modules relocated from implementation files, plus shared test
//! fixtures (embedder-side objects and accessors).

mod helpers;

mod compound_tests;
