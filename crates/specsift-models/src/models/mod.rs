pub mod classifier_trait;
pub mod forest;
pub mod ocsvm;
