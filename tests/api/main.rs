mod appointment;
mod health_check;
mod helpers;
mod payment;
mod wallet;
