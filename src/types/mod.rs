pub mod city;
pub mod month;
pub mod normals;
pub mod station;
