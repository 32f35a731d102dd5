pub use tokio::{
    fs::{File, OpenOptions},
    io::AsyncWriteExt,
};
