/// Router owned by the shell. Calls only signal intent; the shell decides
/// how to animate or stack screens.
pub trait Navigator: Send + Sync {
    fn go_back(&self);

    fn navigate_to(&self, screen: &str);
}
