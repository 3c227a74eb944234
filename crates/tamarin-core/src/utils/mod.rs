pub mod bits;
pub mod cache;
pub mod list;

pub use cache::{CacheEntry, HashTable};
pub use list::{ByteQueue, ByteStack, IntQueue, IntStack, LinkedQueue, LinkedStack};
