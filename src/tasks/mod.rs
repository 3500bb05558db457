pub mod acquisition;

pub use acquisition::acquisition_task;
