mod system_setting;

pub use system_setting::SystemSetting;
