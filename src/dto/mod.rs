pub mod hh_dto;
