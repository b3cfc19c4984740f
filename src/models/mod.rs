pub mod document;

pub use document::{
    AppendixTableData, FillTemplateRequest, GenerateRequest, UpdateAppendixRequest,
    UpdateDateWeatherRequest, UpdatePersonnelRequest,
};
