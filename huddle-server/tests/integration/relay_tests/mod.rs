mod test_join_notifies_existing_members;
mod test_negotiation_forwarding;
mod test_disconnect_broadcasts_leave;
