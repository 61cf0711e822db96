mod documents_tests;
mod import_export_tests;
mod offers_tests;
mod references_tests;
