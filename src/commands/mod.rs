// ACL reconciliation commands
pub mod acl;
